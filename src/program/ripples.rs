//! Rings spreading out on a pond.

use super::Program;
use crate::color::{hsv_to_565, hue_from_fraction};
use crate::grid::PixelGrid;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::trace;

const SPAWN_RADIUS: f32 = 0.01;
const SPAWN_AMPLITUDE: f32 = 1.0;
/// Radius added to every ring per frame.
const EXPANSION_STEP: f32 = 0.2;
/// Rings fainter than this are dropped.
const MIN_AMPLITUDE: f32 = 0.01;
const MIN_DIST_SQ: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RippleConfig {
    /// Hue rotation speed, in turns per second.
    pub speed: f32,
    /// Chance per frame of a new ring.
    pub spawn_probability: f32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            speed: 0.1,
            spawn_probability: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub amplitude: f32,
    pub initial_amplitude: f32,
}

impl Ring {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            radius: SPAWN_RADIUS,
            amplitude: SPAWN_AMPLITUDE,
            initial_amplitude: SPAWN_AMPLITUDE,
        }
    }

    /// Grow the ring; amplitude falls off as `1 / radius`.
    pub fn expand(&mut self, step: f32) {
        self.radius += step;
        self.amplitude = self.initial_amplitude / self.radius;
    }

    /// Distance from a pixel to the ring's edge.
    ///
    /// The vertical term multiplies the y offset by `(x - py)` rather than by the y
    /// offset again, which makes rings lopsided away from the diagonal. This is the
    /// look the effect has always had; negative products are treated as zero.
    pub fn distance(&self, px: f32, py: f32) -> f32 {
        let dx = self.x - px;
        let skewed = (self.y - py) * (self.x - py);
        ((dx * dx + skewed).max(0.0).sqrt() - self.radius).abs()
    }
}

pub struct RippleField {
    config: RippleConfig,
    rng: StdRng,
    rings: Vec<Ring>,
}

impl RippleField {
    /// Starts with one ring somewhere on the panel.
    pub fn new(config: RippleConfig, width: usize, height: usize, mut rng: StdRng) -> Self {
        let first = Ring::new(
            rng.gen_range(0..width.max(1)) as f32,
            rng.gen_range(0..height.max(1)) as f32,
        );
        Self::with_rings(config, vec![first], rng)
    }

    pub fn with_rings(config: RippleConfig, rings: Vec<Ring>, rng: StdRng) -> Self {
        Self { config, rng, rings }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    fn maybe_spawn(&mut self, width: usize, height: usize) {
        if self.rng.gen_range(0.0..1.0) >= self.config.spawn_probability {
            return;
        }
        let x = self.rng.gen_range(1..=width.saturating_sub(1).max(1)) as f32;
        let y = self.rng.gen_range(1..=height.saturating_sub(1).max(1)) as f32;
        trace!(x, y, "ripple spawned");
        self.rings.push(Ring::new(x, y));
    }

    fn intensity_at(&self, x: f32, y: f32) -> f32 {
        let sum: f32 = self
            .rings
            .iter()
            .map(|ring| ring.amplitude / ring.distance(x, y).powi(2).max(MIN_DIST_SQ))
            .sum();
        sum.min(1.0)
    }
}

impl Program for RippleField {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        self.maybe_spawn(grid.width(), grid.height());

        let hue = hue_from_fraction(time * self.config.speed);
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let value = (self.intensity_at(x as f32, y as f32) * 255.0) as u8;
                grid.set_565(x as i32, y as i32, hsv_to_565(hue, 255, value));
            }
        }

        for ring in &mut self.rings {
            ring.expand(EXPANSION_STEP);
        }
        self.rings.retain(|ring| ring.amplitude >= MIN_AMPLITUDE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn still() -> RippleConfig {
        RippleConfig {
            spawn_probability: 0.0,
            ..RippleConfig::default()
        }
    }

    #[test]
    fn amplitude_decays_as_ring_grows() {
        let mut ring = Ring::new(4.0, 4.0);
        let mut last = ring.amplitude;
        for _ in 0..20 {
            ring.expand(EXPANSION_STEP);
            assert!(ring.amplitude < last);
            last = ring.amplitude;
        }
        assert!((ring.radius - (SPAWN_RADIUS + 20.0 * EXPANSION_STEP)).abs() < 1e-4);
    }

    #[test]
    fn distance_keeps_the_skewed_vertical_term() {
        let ring = Ring {
            radius: 0.0,
            ..Ring::new(5.0, 5.0)
        };
        assert_eq!(ring.distance(5.0, 8.0), 3.0);

        let lopsided = Ring {
            radius: 0.0,
            ..Ring::new(2.0, 6.0)
        };
        // (6 - 3) * (2 - 3) is negative and clamps to zero
        assert_eq!(lopsided.distance(2.0, 3.0), 0.0);
    }

    #[test]
    fn ring_count_never_grows_without_spawning() {
        let mut field = RippleField::new(still(), 16, 16, StdRng::seed_from_u64(1));
        let mut grid = PixelGrid::new(16, 16);
        let mut count = field.rings().len();
        assert_eq!(count, 1);
        for frame in 0..600 {
            field.advance(&mut grid, frame as f32 / 60.0);
            assert!(field.rings().len() <= count);
            count = field.rings().len();
        }
        assert_eq!(count, 0);
    }

    #[test]
    fn faded_pond_is_black() {
        let mut field = RippleField::with_rings(still(), Vec::new(), StdRng::seed_from_u64(1));
        let mut grid = PixelGrid::new(8, 8);
        field.advance(&mut grid, 1.0);
        assert!(grid.wire_order().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn fresh_ring_lights_its_center() {
        let ring = Ring::new(3.0, 3.0);
        let mut field = RippleField::with_rings(still(), vec![ring], StdRng::seed_from_u64(1));
        let mut grid = PixelGrid::new(8, 8);
        field.advance(&mut grid, 0.0);
        assert_eq!(grid.get(3, 3), Color::new(255, 0, 0));
    }

    #[test]
    fn spawned_rings_stay_off_the_edges() {
        let config = RippleConfig {
            spawn_probability: 1.0,
            ..RippleConfig::default()
        };
        let mut field = RippleField::with_rings(config, Vec::new(), StdRng::seed_from_u64(12));
        let mut grid = PixelGrid::new(16, 16);
        for frame in 0..30 {
            field.advance(&mut grid, frame as f32);
        }
        assert_eq!(field.rings().len(), 30);
        for ring in field.rings() {
            assert!((1.0..=15.0).contains(&ring.x));
            assert!((1.0..=15.0).contains(&ring.y));
        }
    }
}
