//! Whole-panel color fields: static fill, hue cycling, rainbow waves and noise plasmas.

use super::Program;
use crate::color::{hsv_to_565, hue_from_fraction};
use crate::grid::PixelGrid;
use crate::noise::{Noise, PerlinNoise};
use crate::palette::FIRE;
use rand::Rng;

/// Warm orange.
pub const DEFAULT_STATIC_COLOR: u16 = 0xFC60;

pub struct StaticColor {
    color: u16,
}

impl StaticColor {
    pub fn new(color: u16) -> Self {
        Self { color }
    }
}

impl Program for StaticColor {
    fn advance(&mut self, grid: &mut PixelGrid, _time: f32) {
        grid.fill_565(self.color);
    }
}

/// The whole panel slowly walks the hue wheel.
pub struct Spectral {
    speed: f32,
}

impl Spectral {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl Program for Spectral {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        grid.fill_565(hsv_to_565(hue_from_fraction(time * self.speed), 255, 255));
    }
}

pub struct RainbowWave {
    speed: f32,
    waves: u32,
}

impl RainbowWave {
    pub fn new(speed: f32, waves: u32) -> Self {
        Self { speed, waves }
    }
}

impl Program for RainbowWave {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        let width = grid.width() as f32;
        let phase = (time * self.speed).rem_euclid(1.0);
        for x in 0..grid.width() {
            let hue = self.waves as f32 * (phase + x as f32 / width);
            let color = hsv_to_565(hue_from_fraction(hue), 255, 255);
            for y in 0..grid.height() {
                grid.set_565(x as i32, y as i32, color);
            }
        }
    }
}

/// Hue drawn from a 3D noise field scrolling upward, with a drifting global offset.
pub struct RainbowPlasma<N = PerlinNoise> {
    speed: f32,
    scale: f32,
    noise: N,
}

impl RainbowPlasma<PerlinNoise> {
    pub fn new<R: Rng + ?Sized>(speed: f32, scale: f32, rng: &mut R) -> Self {
        Self::with_noise(speed, scale, PerlinNoise::new(rng))
    }
}

impl<N: Noise> RainbowPlasma<N> {
    pub fn with_noise(speed: f32, scale: f32, noise: N) -> Self {
        Self { speed, scale, noise }
    }
}

impl<N: Noise + Send> Program for RainbowPlasma<N> {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        let t = time * self.speed;
        // Noise is centered on 0, so adding it keeps the mean hue moving continuously.
        let hue_shift = (t * 0.05 + 1.0 + self.noise.noise1(t * 0.2)).rem_euclid(1.0);

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let n = self
                    .noise
                    .noise3(x as f32 / self.scale, y as f32 / self.scale + t, t);
                let hue = ((n + 1.0) / 2.0 + hue_shift).rem_euclid(1.0);
                grid.set_565(x as i32, y as i32, hsv_to_565(hue_from_fraction(hue), 255, 255));
            }
        }
    }
}

/// The rainbow plasma field, but mapped through the fire palette as intensity.
pub struct FirePlasma<N = PerlinNoise> {
    speed: f32,
    scale: f32,
    noise: N,
}

impl FirePlasma<PerlinNoise> {
    pub fn new<R: Rng + ?Sized>(speed: f32, scale: f32, rng: &mut R) -> Self {
        Self::with_noise(speed, scale, PerlinNoise::new(rng))
    }
}

impl<N: Noise> FirePlasma<N> {
    pub fn with_noise(speed: f32, scale: f32, noise: N) -> Self {
        Self { speed, scale, noise }
    }
}

impl<N: Noise + Send> Program for FirePlasma<N> {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        let t = time * self.speed;

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let n = self
                    .noise
                    .noise3(x as f32 / self.scale, y as f32 / self.scale + t, t);
                grid.set_565(x as i32, y as i32, FIRE.lookup((n + 1.0) / 2.0));
            }
        }
    }
}
