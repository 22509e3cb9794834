//! Point and line generators that leave fading trails behind them.

use super::{Program, period_for_speed};
use crate::blur::ConvolutionFilter;
use crate::color::{Color, compress_888, hsv_to_565, hue_from_fraction};
use crate::grid::PixelGrid;
use crate::value_map::ValueMap;
use rand::Rng;
use rand::rngs::StdRng;
use std::f32::consts::TAU;

// ── Matrix rain ─────────────────────────────────────────────────────

const RAIN_COLOR: u32 = 0x00FF00;
const RAIN_DIMMING: f32 = 0.67;
const RAIN_ATTEMPTS: usize = 3;
const RAIN_PROBABILITY: f32 = 0.10;

/// Green drops falling one row per step, each leaving a dimming trail.
pub struct MatrixRain {
    rng: StdRng,
    trails: ValueMap<u32>,
    period: u32,
    cycles: u32,
}

impl MatrixRain {
    pub fn new(speed: f32, width: usize, height: usize, rng: StdRng) -> Self {
        let period = period_for_speed(speed);
        Self {
            rng,
            trails: ValueMap::new(width, height),
            period,
            cycles: period,
        }
    }

    pub fn trails(&self) -> &ValueMap<u32> {
        &self.trails
    }

    /// Move every lit cell down by one and dim what it leaves behind.
    fn fall(&mut self) {
        let (width, height) = (self.trails.width(), self.trails.height());
        for y in (0..height).rev() {
            for x in 0..width {
                let color = self.trails.get(x, y);
                if color == 0 {
                    continue;
                }
                if y + 1 < height {
                    self.trails.set(x, y + 1, color);
                }
                self.trails.set(x, y, dim_trail(color));
            }
        }
    }

    fn spawn(&mut self) {
        let width = self.trails.width();
        if width == 0 || self.trails.height() == 0 {
            return;
        }
        for _ in 0..RAIN_ATTEMPTS {
            if self.rng.gen_range(0.0..1.0) < RAIN_PROBABILITY {
                let x = self.rng.gen_range(0..width);
                self.trails.set(x, 0, RAIN_COLOR);
            }
        }
    }
}

/// Scale each channel of a packed trail color by the dimming factor.
///
/// The blue channel is read through the red mask, so it always comes out as zero.
/// Rain is pure green, so nothing visible is lost.
fn dim_trail(color: u32) -> u32 {
    let r = ((color & 0xFF0000) >> 16) as u8;
    let g = ((color & 0x00FF00) >> 8) as u8;
    let b = (color & 0xFF0000) as u8;
    let dim = |c: u8| (c as f32 * RAIN_DIMMING).round() as u32;
    dim(r) << 16 | dim(g) << 8 | dim(b)
}

impl Program for MatrixRain {
    fn advance(&mut self, grid: &mut PixelGrid, _time: f32) {
        if self.cycles >= self.period {
            self.fall();
            self.spawn();
            self.cycles = 0;
        }
        self.cycles += 1;

        for y in 0..self.trails.height() {
            for x in 0..self.trails.width() {
                grid.set_565(x as i32, y as i32, compress_888(self.trails.get(x, y)));
            }
        }
    }
}

// ── Vortex ──────────────────────────────────────────────────────────

const VORTEX_FADE: f32 = 0.75;
const VORTEX_RINGS: usize = 2;
const VORTEX_ARMS: usize = 3;

/// Six points orbiting on nested, phase-shifted sinusoids.
pub struct Vortex {
    speed: f32,
}

impl Vortex {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl Program for Vortex {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        grid.fade_to_black(VORTEX_FADE);

        let t = time * self.speed;
        let (width, height) = (grid.width() as f32, grid.height() as f32);
        let total = (VORTEX_RINGS + VORTEX_ARMS) as f32;

        for i in 0..VORTEX_RINGS {
            for j in 0..VORTEX_ARMS {
                let inset = (j * 2) as f32;
                let (min_x, max_x) = (inset + 1.0, width - 1.0 - inset);
                let (min_y, max_y) = (inset + 1.0, height - 1.0 - inset);
                let spin = t * (i + j) as f32;
                let (phase_x, phase_y) = if j % 2 == 1 { (128.0, 192.0) } else { (0.0, 64.0) };

                let x = ((t + phase_x + spin).sin() * 0.5 + 0.5) * (max_x - min_x) + min_x;
                let y = ((1.1 * t + phase_y + spin).sin() * 0.5 + 0.5) * (max_y - min_y) + min_y;
                let hue = (t / 10.0).rem_euclid(1.0) + (i + j) as f32 / total;
                grid.set_565(x as i32, y as i32, hsv_to_565(hue_from_fraction(hue), 255, 255));
            }
        }
    }
}

// ── Bursts ──────────────────────────────────────────────────────────

const BURST_FADE: f32 = 0.7;
const BURST_BLUR: f32 = 0.45;
const BURST_MIN_LINES: u32 = 5;
const BURST_MAX_LINES: u32 = 15;
/// Chance per frame that the ray count drifts by one.
const BURST_DRIFT_PROBABILITY: f32 = 0.05;

/// Rays shooting out of a center that wanders around the panel. The number of rays
/// drifts between 5 and 15.
pub struct Bursts {
    speed: f32,
    rng: StdRng,
    lines: u32,
    blur: ConvolutionFilter,
}

impl Bursts {
    pub fn new(speed: f32, rng: StdRng) -> Self {
        Self {
            speed,
            rng,
            lines: (BURST_MIN_LINES + BURST_MAX_LINES) / 2,
            blur: ConvolutionFilter::new(BURST_BLUR),
        }
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    fn drift_lines(&mut self) {
        if self.rng.gen_range(0.0..1.0) < BURST_DRIFT_PROBABILITY {
            let step: i32 = if self.rng.gen_bool(0.5) { 1 } else { -1 };
            self.lines = (self.lines as i32 + step)
                .clamp(BURST_MIN_LINES as i32, BURST_MAX_LINES as i32) as u32;
        }
    }
}

impl Program for Bursts {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        self.drift_lines();
        grid.fade_to_black(BURST_FADE);

        let t = time * self.speed;
        let (width, height) = (grid.width() as f32, grid.height() as f32);
        let cx = width / 2.0 + (t * 0.7).sin() * width / 4.0;
        let cy = height / 2.0 + (t * 0.9).cos() * height / 4.0;
        let reach = width.max(height) / 2.0;

        for i in 0..self.lines {
            let share = i as f32 / self.lines as f32;
            let angle = t + share * TAU;
            let length = reach * (0.5 + 0.5 * (t * 3.0 + i as f32).sin());
            let color = Color::from_565(hsv_to_565(hue_from_fraction(share + t * 0.1), 255, 255));
            grid.draw_line(
                cx as i32,
                cy as i32,
                (cx + angle.cos() * length).round() as i32,
                (cy + angle.sin() * length).round() as i32,
                color,
            );
        }

        self.blur.apply(grid);
    }
}

// ── Lissajous ───────────────────────────────────────────────────────

const LISSAJOUS_FADE: f32 = 0.8;
const LISSAJOUS_SAMPLES: usize = 12;
/// Parameter distance between consecutive samples of the trail.
const LISSAJOUS_SPACING: f32 = 0.03;

pub struct Lissajous {
    speed: f32,
}

impl Lissajous {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl Program for Lissajous {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        grid.fade_to_black(LISSAJOUS_FADE);

        let t = time * self.speed;
        let half_w = (grid.width() as f32 - 1.0) / 2.0;
        let half_h = (grid.height() as f32 - 1.0) / 2.0;
        // The phase between the axes creeps so the figure keeps changing shape.
        let phase = t * 0.1;

        for k in 0..LISSAJOUS_SAMPLES {
            let s = t + k as f32 * LISSAJOUS_SPACING;
            let x = half_w + half_w * (3.0 * s + phase).sin();
            let y = half_h + half_h * (2.0 * s).sin();
            let hue = k as f32 / LISSAJOUS_SAMPLES as f32 + t * 0.05;
            grid.set_565(
                x.round() as i32,
                y.round() as i32,
                hsv_to_565(hue_from_fraction(hue), 255, 255),
            );
        }
    }
}

// ── DNA spiral ──────────────────────────────────────────────────────

const DNA_FADE: f32 = 0.6;
const DNA_TWIST: f32 = 0.4;
const DNA_RUNG_EVERY: usize = 3;
const DNA_RUNG_VALUE: u8 = 96;

/// Two counter-phased strands winding down the panel, joined by rungs.
pub struct DnaSpiral {
    speed: f32,
}

impl DnaSpiral {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl Program for DnaSpiral {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        grid.fade_to_black(DNA_FADE);

        let t = time * self.speed;
        let height = grid.height();
        let center = (grid.width() as f32 - 1.0) / 2.0;

        for y in 0..height {
            let phase = t * 2.0 + y as f32 * DNA_TWIST;
            let offset = phase.sin() * center;
            let x1 = (center + offset).round() as i32;
            let x2 = (center - offset).round() as i32;
            let hue = y as f32 / height as f32 + t * 0.1;
            // The strand in front is drawn brighter than the one behind.
            let depth = phase.cos();
            let (v1, v2) = if depth >= 0.0 { (255, 128) } else { (128, 255) };

            if y % DNA_RUNG_EVERY == 0 {
                let rung = Color::from_565(hsv_to_565(hue_from_fraction(hue + 0.25), 128, DNA_RUNG_VALUE));
                grid.draw_line(x1, y as i32, x2, y as i32, rung);
            }
            grid.set_565(x1, y as i32, hsv_to_565(hue_from_fraction(hue), 255, v1));
            grid.set_565(x2, y as i32, hsv_to_565(hue_from_fraction(hue + 0.5), 255, v2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn lit(grid: &PixelGrid) -> usize {
        grid.wire_order().iter().filter(|&&c| c != Color::BLACK).count()
    }

    #[test]
    fn trail_dimming_drops_blue() {
        assert_eq!(dim_trail(0x00FF00), 0x00AB00);
        assert_eq!(dim_trail(0x6400FF), 0x430000);
    }

    #[test]
    fn drops_fall_and_leave_a_trail() {
        let mut rain = MatrixRain::new(1.0, 1, 4, StdRng::seed_from_u64(0));
        rain.trails.set(0, 0, RAIN_COLOR);
        rain.fall();
        assert_eq!(rain.trails().get(0, 1), RAIN_COLOR);
        assert_eq!(rain.trails().get(0, 0), 0x00AB00);
        rain.fall();
        assert_eq!(rain.trails().get(0, 2), RAIN_COLOR);
        assert_eq!(rain.trails().get(0, 1), 0x00AB00);
        assert_eq!(rain.trails().get(0, 0), 0x007300);
    }

    #[test]
    fn rain_renders_green_only() {
        let mut rain = MatrixRain::new(1.0, 16, 16, StdRng::seed_from_u64(3));
        let mut grid = PixelGrid::new(16, 16);
        for frame in 0..60 {
            rain.advance(&mut grid, frame as f32 / 60.0);
        }
        assert!(lit(&grid) > 0);
        assert!(grid.wire_order().iter().all(|c| c.r == 0 && c.b == 0));
    }

    #[test]
    fn vortex_draws_six_points_on_a_blank_grid() {
        let mut grid = PixelGrid::new(16, 16);
        Vortex::new(1.0).advance(&mut grid, 2.5);
        let count = lit(&grid);
        assert!((1..=6).contains(&count), "{count}");
    }

    #[test]
    fn burst_line_count_stays_in_range() {
        let mut bursts = Bursts::new(1.0, StdRng::seed_from_u64(21));
        let mut grid = PixelGrid::new(16, 16);
        for frame in 0..2000 {
            bursts.advance(&mut grid, frame as f32 / 60.0);
            assert!((BURST_MIN_LINES..=BURST_MAX_LINES).contains(&bursts.lines()));
        }
        assert!(lit(&grid) > 0);
    }

    #[test]
    fn lissajous_draws_at_most_one_pixel_per_sample() {
        for step in 0..50 {
            let mut grid = PixelGrid::new(16, 16);
            Lissajous::new(1.0).advance(&mut grid, step as f32 * 0.37);
            assert!((1..=LISSAJOUS_SAMPLES).contains(&lit(&grid)));
        }
    }

    #[test]
    fn dna_lights_every_row() {
        let mut grid = PixelGrid::new(16, 16);
        DnaSpiral::new(1.0).advance(&mut grid, 1.3);
        for y in 0..16 {
            assert!((0..16).any(|x| grid.get(x, y) != Color::BLACK), "row {y} dark");
        }
    }
}
