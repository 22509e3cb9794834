//! Heat diffusion fire.
//!
//! A heat map is ignited along the bottom row and convected upward one row per
//! simulation step, while a cooling map built from fractal noise scrolls along with
//! it and eats away at the heat. The simulation runs every `round(1 / speed)` frames
//! and every frame renders a mix of the previous and current heat through the fire
//! palette.

use super::{Program, period_for_speed};
use crate::grid::PixelGrid;
use crate::noise::{Noise, PerlinNoise};
use crate::palette::FIRE;
use crate::value_map::ValueMap;
use rand::Rng;

/// Heat written into the bottom row on every step.
const IGNITION_HEAT: f32 = 1.0;
/// Amplitude falloff between noise octaves.
const OCTAVE_PERSISTENCE: f32 = 0.5;
/// Weight of the previous heat map when rendering.
const PREVIOUS_WEIGHT: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FireConfig {
    pub speed: f32,
    /// Spatial scale of the cooling noise; larger is smoother.
    pub noise_scale: f32,
    /// Larger values cool more slowly, so flames reach higher.
    pub flame_height: f32,
    pub octaves: u32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            speed: 0.25,
            noise_scale: 5.0,
            flame_height: 10.0,
            octaves: 3,
        }
    }
}

pub struct FireDiffusion<N = PerlinNoise> {
    config: FireConfig,
    noise: N,
    heat: ValueMap<f32>,
    previous_heat: ValueMap<f32>,
    cooling: ValueMap<f32>,
    period: u32,
    cycles: u32,
}

impl FireDiffusion<PerlinNoise> {
    pub fn new<R: Rng + ?Sized>(config: FireConfig, width: usize, height: usize, rng: &mut R) -> Self {
        Self::with_noise(config, width, height, PerlinNoise::new(rng))
    }
}

impl<N: Noise> FireDiffusion<N> {
    pub fn with_noise(config: FireConfig, width: usize, height: usize, noise: N) -> Self {
        let period = period_for_speed(config.speed);
        Self {
            config,
            noise,
            heat: ValueMap::new(width, height),
            previous_heat: ValueMap::new(width, height),
            cooling: ValueMap::new(width, height),
            period,
            // Start at the boundary so the very first frame runs a step.
            cycles: period,
        }
    }

    pub fn heat(&self) -> &ValueMap<f32> {
        &self.heat
    }

    pub fn previous_heat(&self) -> &ValueMap<f32> {
        &self.previous_heat
    }

    pub fn cooling(&self) -> &ValueMap<f32> {
        &self.cooling
    }

    /// How far the current frame is between two simulation steps, in `[0, 1)`.
    ///
    /// Rendering does not use this yet and always mixes the two heat maps evenly.
    pub fn blend_fraction(&self) -> f32 {
        self.cycles as f32 / self.period as f32
    }

    fn step(&mut self, time: f32) {
        let height = self.heat.height();
        if height == 0 {
            return;
        }
        self.previous_heat.copy_from(&self.heat);

        self.heat.shift_rows_up();
        self.heat.fill_row(height - 1, IGNITION_HEAT);

        self.cooling.shift_rows_up();
        let scale = self.config.noise_scale;
        let offset = time * self.config.speed;
        for x in 0..self.cooling.width() {
            let n = self.noise.noise2_octaves(
                x as f32 / scale,
                height as f32 / scale + offset,
                self.config.octaves,
                OCTAVE_PERSISTENCE,
            );
            self.cooling.set(x, height - 1, (n + 1.0) / 2.0);
        }

        let flame_height = self.config.flame_height;
        for (heat, cooling) in self.heat.values_mut().iter_mut().zip(self.cooling.values()) {
            *heat = (*heat - cooling / flame_height).max(0.0);
        }
    }
}

impl<N: Noise + Send> Program for FireDiffusion<N> {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        if self.cycles >= self.period {
            self.step(time);
            self.cycles = 0;
        }

        for y in 0..self.heat.height() {
            for x in 0..self.heat.width() {
                let value = PREVIOUS_WEIGHT * self.previous_heat.get(x, y)
                    + (1.0 - PREVIOUS_WEIGHT) * self.heat.get(x, y);
                grid.set_565(x as i32, y as i32, FIRE.lookup(value));
            }
        }

        self.cycles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;

    /// Noise that is 0 everywhere, so every cooling cell is exactly 0.5.
    struct ZeroNoise;

    impl Noise for ZeroNoise {
        fn noise1(&self, _x: f32) -> f32 {
            0.0
        }
        fn noise2(&self, _x: f32, _y: f32) -> f32 {
            0.0
        }
        fn noise3(&self, _x: f32, _y: f32, _z: f32) -> f32 {
            0.0
        }
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-5, "{actual} != {expected}");
    }

    #[test]
    fn first_frame_ignites_bottom_row() {
        let config = FireConfig {
            speed: 0.1,
            ..FireConfig::default()
        };
        let mut fire = FireDiffusion::with_noise(config, 4, 4, ZeroNoise);
        let mut grid = PixelGrid::new(4, 4);
        fire.advance(&mut grid, 0.0);

        for x in 0..4 {
            assert_close(fire.heat().get(x, 3), 1.0 - 0.5 / 10.0);
            assert_eq!(fire.heat().get(x, 0), 0.0);
        }
        assert_eq!(fire.blend_fraction(), 0.1);
    }

    #[test]
    fn heat_convects_and_cools() {
        let config = FireConfig {
            speed: 1.0,
            flame_height: 10.0,
            ..FireConfig::default()
        };
        let mut fire = FireDiffusion::with_noise(config, 3, 6, ZeroNoise);
        let mut grid = PixelGrid::new(3, 6);
        for frame in 0..3 {
            fire.advance(&mut grid, frame as f32);
        }

        for x in 0..3 {
            assert_close(fire.heat().get(x, 5), 0.95);
            assert_close(fire.heat().get(x, 4), 0.90);
            assert_close(fire.heat().get(x, 3), 0.85);
            assert_eq!(fire.heat().get(x, 2), 0.0);
            assert_close(fire.cooling().get(x, 3), 0.5);
        }
    }

    #[test]
    fn previous_heat_is_the_state_before_the_step() {
        let config = FireConfig {
            speed: 1.0,
            ..FireConfig::default()
        };
        let mut fire = FireDiffusion::with_noise(config, 2, 4, ZeroNoise);
        let mut grid = PixelGrid::new(2, 4);
        fire.advance(&mut grid, 0.0);
        let after_first = fire.heat().clone();
        fire.advance(&mut grid, 1.0);
        assert_eq!(fire.previous_heat(), &after_first);
    }

    #[test]
    fn renders_even_mix_through_palette() {
        let config = FireConfig {
            speed: 1.0,
            flame_height: 10.0,
            ..FireConfig::default()
        };
        let mut fire = FireDiffusion::with_noise(config, 2, 2, ZeroNoise);
        let mut grid = PixelGrid::new(2, 2);
        fire.advance(&mut grid, 0.0);
        // bottom: (0 + 0.95) / 2 = 0.475, index round(17.1) = 17
        assert_eq!(grid.get(0, 1), Color::from_565(0xD321));
        assert_eq!(grid.get(0, 0), Color::BLACK);
    }

    /// Noise that varies across columns but not along them, so each column cools
    /// at its own constant rate.
    struct ColumnNoise;

    impl Noise for ColumnNoise {
        fn noise1(&self, x: f32) -> f32 {
            (x * 0.7).sin()
        }
        fn noise2(&self, x: f32, _y: f32) -> f32 {
            (x * 0.7).sin()
        }
        fn noise3(&self, x: f32, _y: f32, _z: f32) -> f32 {
            (x * 0.7).sin()
        }
    }

    #[test]
    fn heat_never_rises_up_a_column_across_reseeds() {
        let config = FireConfig {
            speed: 1.0,
            flame_height: 50.0,
            noise_scale: 3.0,
            octaves: 3,
        };
        let mut fire = FireDiffusion::with_noise(config, 16, 16, ColumnNoise);
        let mut grid = PixelGrid::new(16, 16);

        let mut reseeds = 0;
        for frame in 0..40 {
            let before = fire.heat().clone();
            fire.advance(&mut grid, frame as f32 / 60.0);
            if frame < 16 {
                // still climbing
                assert_ne!(fire.heat(), &before);
            }
            let reseeded = (0..16).all(|x| {
                let expected = IGNITION_HEAT - fire.cooling().get(x, 15) / 50.0;
                (fire.heat().get(x, 15) - expected).abs() < 1e-6
            });
            if reseeded {
                reseeds += 1;
            }

            for x in 0..16 {
                for y in 0..15 {
                    let (above, below) = (fire.heat().get(x, y), fire.heat().get(x, y + 1));
                    assert!(above <= below, "frame {frame}, column {x}: {above} > {below} at row {y}");
                }
            }
        }
        assert!(reseeds >= 2);

        // after more steps than rows the flame reaches the top without burning out
        for x in 0..16 {
            let top = fire.heat().get(x, 0);
            assert!(top > 0.0 && top < fire.heat().get(x, 15));
        }
        for &h in fire.heat().values() {
            assert!((0.0..=1.0).contains(&h));
        }
    }
}
