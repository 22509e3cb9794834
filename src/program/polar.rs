//! Patterns laid out around the panel center.

use super::Program;
use crate::blur::ConvolutionFilter;
use crate::color::{Color, hsv_to_565, hue_from_fraction};
use crate::grid::PixelGrid;
use crate::value_map::ValueMap;
use std::f32::consts::TAU;

// ── Kaleidoscope ────────────────────────────────────────────────────

const KALEIDOSCOPE_FADE: f32 = 0.85;
const KALEIDOSCOPE_BLUR: f32 = 0.3;
const KALEIDOSCOPE_SEEDS: usize = 3;
/// Turns per second of the whole pattern.
const KALEIDOSCOPE_SPIN: f32 = 0.3;

/// A few orbiting seeds, each reflected into all eight octants.
pub struct Kaleidoscope {
    speed: f32,
    blur: ConvolutionFilter,
}

impl Kaleidoscope {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            blur: ConvolutionFilter::new(KALEIDOSCOPE_BLUR),
        }
    }
}

/// Draw `(x, y)` and its reflections across both center lines and the diagonal.
fn plot_mirrored(grid: &mut PixelGrid, x: i32, y: i32, color: Color) {
    let mirror_x = grid.width() as i32 - 1 - x;
    let mirror_y = grid.height() as i32 - 1 - y;
    for (a, b) in [(x, y), (mirror_x, y), (x, mirror_y), (mirror_x, mirror_y)] {
        grid.set(a, b, color);
        grid.set(b, a, color);
    }
}

impl Program for Kaleidoscope {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        grid.fade_to_black(KALEIDOSCOPE_FADE);

        let t = time * self.speed;
        let cx = (grid.width() as f32 - 1.0) / 2.0;
        let cy = (grid.height() as f32 - 1.0) / 2.0;
        let max_radius = cx.min(cy);
        let rotation = t * KALEIDOSCOPE_SPIN * TAU;

        for seed in 0..KALEIDOSCOPE_SEEDS {
            let s = seed as f32;
            let angle = t * (0.6 + 0.2 * s) + s * TAU / KALEIDOSCOPE_SEEDS as f32 + rotation;
            let radius = max_radius * (0.35 + 0.3 * (t * 0.5 + s).sin());
            let x = (cx + radius * angle.cos()).round() as i32;
            let y = (cy + radius * angle.sin()).round() as i32;
            let hue = s / KALEIDOSCOPE_SEEDS as f32 + t * 0.05;
            let color = Color::from_565(hsv_to_565(hue_from_fraction(hue), 255, 255));
            plot_mirrored(grid, x, y, color);
        }

        self.blur.apply(grid);
    }
}

// ── Octopus ─────────────────────────────────────────────────────────

const OCTOPUS_BLUR: f32 = 0.5;
const MIN_LEGS: f32 = 1.0;
const MAX_LEGS: f32 = 5.0;
/// Byte-phase units per second, one full wave every 256.
const OCTOPUS_RATE: f32 = 60.0;
/// How fast the leg count oscillates, in radians per second.
const LEG_SWING: f32 = 0.1;

/// Full sine wave over one byte of phase, scaled into `[0, 255]`.
fn sin8(phase: f32) -> f32 {
    ((phase / 256.0 * TAU).sin() + 1.0) * 127.5
}

/// Wavy tentacles radiating from the center. Angle and radius of every pixel are
/// precomputed in byte units (256 per turn, 255 at the farthest edge).
pub struct Octopus {
    speed: f32,
    angles: ValueMap<f32>,
    radii: ValueMap<f32>,
    blur: ConvolutionFilter,
}

impl Octopus {
    pub fn new(speed: f32, width: usize, height: usize) -> Self {
        let mut angles = ValueMap::new(width, height);
        let mut radii = ValueMap::new(width, height);
        let cx = (width as f32 - 1.0) / 2.0;
        let cy = (height as f32 - 1.0) / 2.0;
        let radius_scale = 255.0 / width.max(height).max(1) as f32;

        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                angles.set(x, y, dy.atan2(dx).rem_euclid(TAU) / TAU * 256.0);
                radii.set(x, y, (dx * dx + dy * dy).sqrt() * radius_scale);
            }
        }

        Self {
            speed,
            angles,
            radii,
            blur: ConvolutionFilter::new(OCTOPUS_BLUR),
        }
    }

    fn legs(&self, time: f32) -> f32 {
        let swing = ((time * self.speed * LEG_SWING).sin() + 1.0) / 2.0;
        (MIN_LEGS + swing * (MAX_LEGS - MIN_LEGS)).round()
    }
}

impl Program for Octopus {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        let t = time * self.speed * OCTOPUS_RATE;
        let legs = self.legs(time);

        for y in 0..self.angles.height() {
            for x in 0..self.angles.width() {
                let angle = self.angles.get(x, y);
                let radius = self.radii.get(x, y);
                let inner = sin8((angle * 4.0 - radius) / 4.0 + t);
                let value = sin8(inner + radius - t * 2.0 + angle * legs);
                let hue = (t / 2.0 - radius) / 256.0;
                let color = hsv_to_565(hue_from_fraction(hue), 255, value as u8);
                grid.set_565(x as i32, y as i32, color);
            }
        }

        self.blur.apply(grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 127.5)]
    #[case(64.0, 255.0)]
    #[case(192.0, 0.0)]
    fn sin8_covers_a_byte(#[case] phase: f32, #[case] expected: f32) {
        assert!((sin8(phase) - expected).abs() < 1e-3);
    }

    #[test]
    fn kaleidoscope_is_mirror_symmetric() {
        let mut program = Kaleidoscope::new(1.0);
        let mut grid = PixelGrid::new(16, 16);
        for frame in 0..30 {
            program.advance(&mut grid, frame as f32 / 30.0);
        }
        assert!(grid.wire_order().iter().any(|&c| c != Color::BLACK));
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(grid.get(x, y), grid.get(15 - x, y));
                assert_eq!(grid.get(x, y), grid.get(x, 15 - y));
                assert_eq!(grid.get(x, y), grid.get(y, x));
            }
        }
    }

    #[test]
    fn octopus_maps_are_polar() {
        let octopus = Octopus::new(1.0, 15, 15);
        // center pixel sits exactly on the origin
        assert_eq!(octopus.radii.get(7, 7), 0.0);
        assert_eq!(octopus.angles.get(14, 7), 0.0);
        assert!((octopus.angles.get(7, 14) - 64.0).abs() < 1e-3);
        assert!((octopus.radii.get(14, 7) - 7.0 * 17.0).abs() < 1e-3);
    }

    #[test]
    fn leg_count_stays_in_range() {
        let octopus = Octopus::new(1.0, 16, 16);
        for second in 0..200 {
            let legs = octopus.legs(second as f32);
            assert!((MIN_LEGS..=MAX_LEGS).contains(&legs));
            assert_eq!(legs, legs.round());
        }
    }

    #[test]
    fn octopus_lights_the_panel() {
        let mut grid = PixelGrid::new(16, 16);
        Octopus::new(1.0, 16, 16).advance(&mut grid, 4.0);
        let lit = grid.wire_order().iter().filter(|&&c| c != Color::BLACK).count();
        assert!(lit > 64);
    }
}
