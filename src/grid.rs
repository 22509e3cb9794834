//! The pixel grid every program draws into.
//!
//! Pixels are stored in the order the LED strip is wired: a serpentine layout where
//! even rows run left to right and odd rows run right to left. `get`/`set` take
//! logical `(x, y)` coordinates; `get_index`/`set_index` address the raw strip.

use crate::PanelConfig;
use crate::color::Color;
use image::{Rgb, RgbImage};

/// Linear strip index of a logical pixel.
pub fn xy_to_n(x: usize, y: usize, width: usize) -> usize {
    match y % 2 {
        0 => y * width + x,               // Even rows: left to right
        _ => y * width + (width - 1 - x), // Odd rows: right to left
    }
}

/// Logical pixel of a linear strip index.
pub fn n_to_xy(n: usize, width: usize) -> (usize, usize) {
    let y = n / width;
    let x = match y % 2 {
        0 => n % width,
        _ => width - 1 - (n % width),
    };
    (x, y)
}

/// Channels whose sum is at or below this after a fade are snapped to black.
const FADE_SNAP_SUM: u32 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; width * height],
        }
    }

    pub fn from_panel(panel: PanelConfig) -> Self {
        Self::new(panel.cols as usize, panel.rows as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Read a logical pixel. Coordinates must be inside the grid.
    pub fn get(&self, x: usize, y: usize) -> Color {
        self.pixels[xy_to_n(x, y, self.width)]
    }

    /// Read a logical pixel, clamping the coordinates to the nearest edge.
    pub fn get_clamped(&self, x: i32, y: i32) -> Color {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.get(x, y)
    }

    /// Write a logical pixel. Writes outside the grid are ignored.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if self.contains(x, y) {
            let n = xy_to_n(x as usize, y as usize, self.width);
            self.pixels[n] = color;
        }
    }

    pub fn set_565(&mut self, x: i32, y: i32, color: u16) {
        self.set(x, y, Color::from_565(color));
    }

    pub fn get_index(&self, n: usize) -> Color {
        self.pixels[n]
    }

    pub fn set_index(&mut self, n: usize, color: Color) {
        self.pixels[n] = color;
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn fill_565(&mut self, color: u16) {
        self.fill(Color::from_565(color));
    }

    pub fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    /// Dim every pixel by `factor` to leave motion trails. Pixels that end up
    /// nearly black are cleared so trails actually disappear.
    pub fn fade_to_black(&mut self, factor: f32) {
        for pixel in &mut self.pixels {
            let faded = pixel.scale(factor);
            *pixel = if faded.channel_sum() > FADE_SNAP_SUM {
                faded
            } else {
                Color::BLACK
            };
        }
    }

    /// Draw a line with Bresenham's algorithm, clipping at the edges.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Copy of this grid with brightness (0-100) applied to every channel.
    pub fn with_brightness(&self, brightness: u8) -> PixelGrid {
        let mut out = self.clone();
        if brightness < 100 {
            for pixel in &mut out.pixels {
                *pixel = pixel.apply_brightness(brightness);
            }
        }
        out
    }

    /// Estimated current in amps, assuming each fully lit channel draws
    /// `amps_per_channel` and scales linearly with its value.
    pub fn current_draw(&self, amps_per_channel: f32) -> f32 {
        let sum: u32 = self.pixels.iter().map(|p| p.channel_sum()).sum();
        (sum as f32 / 255.0) * amps_per_channel
    }

    pub fn power_draw(&self, amps_per_channel: f32, volts: f32) -> f32 {
        self.current_draw(amps_per_channel) * volts
    }

    /// Pixels in strip (wiring) order.
    pub fn wire_order(&self) -> &[Color] {
        &self.pixels
    }

    /// Iterate logical pixels row by row as `(x, y, color)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y, self.get(x, y))))
    }

    /// Row-major RGB24 bytes, three per pixel.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.iter().flat_map(|(_, _, c)| [c.r, c.g, c.b]).collect()
    }

    /// The grid as an image, each pixel blown up to a `scale × scale` block.
    pub fn to_rgb_image(&self, scale: u32) -> RgbImage {
        let scale = scale.max(1);
        RgbImage::from_fn(self.width as u32 * scale, self.height as u32 * scale, |x, y| {
            let c = self.get((x / scale) as usize, (y / scale) as usize);
            Rgb([c.r, c.g, c.b])
        })
    }
}
