//! Falling sand cellular automaton.
//!
//! Colored grains drop in at the top center, fall straight down when they can and
//! otherwise slide diagonally, piling up around a fixed obstacle. The bottom row
//! slowly drains so the pile never fills the panel.

use super::{Program, period_for_speed};
use crate::color::{hsv_to_565, hue_from_fraction, lerp_565};
use crate::grid::PixelGrid;
use crate::value_map::ValueMap;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::trace;

const EMPTY: u16 = 0;
const OBSTACLE_COLOR: u16 = 0xFFFF;
/// Grain hue advances this much slower than the simulation clock.
const HUE_DRIFT: f32 = 0.01;

const SPRITE_SIZE: usize = 4;
const SPRITE: [[bool; SPRITE_SIZE]; SPRITE_SIZE] = [
    [false, true, true, false],
    [true, true, true, true],
    [true, true, true, true],
    [false, true, true, false],
];

/// A rounded 4×4 block that sand piles on and flows around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Obstacle {
    pub x: usize,
    pub y: usize,
}

impl Obstacle {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn in_hitbox(&self, x: usize, y: usize) -> bool {
        (self.x..self.x + SPRITE_SIZE).contains(&x)
            && (self.y..self.y + SPRITE_SIZE).contains(&y)
            && SPRITE[y - self.y][x - self.x]
    }

    fn columns(&self) -> std::ops::Range<usize> {
        self.x..self.x + SPRITE_SIZE
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SandConfig {
    pub speed: f32,
    /// Chance per step of a new grain at the top.
    pub spawn_probability: f32,
    /// Chance per step of a random bottom-row cell being cleared.
    pub drain_probability: f32,
    pub obstacle: Option<Obstacle>,
}

impl Default for SandConfig {
    fn default() -> Self {
        Self {
            speed: 0.25,
            spawn_probability: 0.10,
            drain_probability: 0.105,
            obstacle: Some(Obstacle::new(6, 4)),
        }
    }
}

pub struct FallingSand {
    config: SandConfig,
    rng: StdRng,
    current: ValueMap<u16>,
    previous: ValueMap<u16>,
    period: u32,
    cycles: u32,
}

impl FallingSand {
    pub fn new(config: SandConfig, width: usize, height: usize, rng: StdRng) -> Self {
        let mut sand = Self {
            config,
            rng,
            current: ValueMap::new(width, height),
            previous: ValueMap::new(width, height),
            period: period_for_speed(config.speed),
            cycles: 0,
        };
        sand.stamp_obstacle();
        sand.previous.copy_from(&sand.current);
        sand
    }

    /// Packed RGB565 grains after the latest step. 0 is empty.
    pub fn cells(&self) -> &ValueMap<u16> {
        &self.current
    }

    /// Drop a grain into the current state. Obstacle cells and out-of-range
    /// coordinates are left alone.
    pub fn place_grain(&mut self, x: usize, y: usize, color: u16) {
        if x < self.current.width() && y < self.current.height() && !self.is_obstacle(x, y) {
            self.current.set(x, y, color);
        }
    }

    fn is_obstacle(&self, x: usize, y: usize) -> bool {
        self.config.obstacle.is_some_and(|o| o.in_hitbox(x, y))
    }

    fn stamp_obstacle(&mut self) {
        let Some(obstacle) = self.config.obstacle else {
            return;
        };
        for y in obstacle.y..(obstacle.y + SPRITE_SIZE).min(self.current.height()) {
            for x in obstacle.columns() {
                if x < self.current.width() && obstacle.in_hitbox(x, y) {
                    self.current.set(x, y, OBSTACLE_COLOR);
                }
            }
        }
    }

    /// Whether `(x, y)` holds nothing. Cells outside the map count as occupied.
    fn is_empty(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.current.width()
            && (y as usize) < self.current.height()
            && self.current.get(x as usize, y as usize) == EMPTY
    }

    fn roll(&mut self, probability: f32) -> bool {
        self.rng.gen_range(0.0..1.0) < probability
    }

    fn drain(&mut self) {
        let (width, height) = (self.current.width(), self.current.height());
        if width == 0 || height == 0 || !self.roll(self.config.drain_probability) {
            return;
        }
        let x = self.rng.gen_range(0..width);
        if !self.is_obstacle(x, height - 1) {
            self.current.set(x, height - 1, EMPTY);
        }
    }

    fn settle(&mut self) {
        let (width, height) = (self.current.width(), self.current.height());
        for y in (0..height.saturating_sub(1)).rev() {
            for x in (0..width).rev() {
                if self.is_obstacle(x, y) {
                    self.current.set(x, y, OBSTACLE_COLOR);
                    continue;
                }
                let grain = self.current.get(x, y);
                if grain == EMPTY {
                    continue;
                }

                let (xi, yi) = (x as isize, y as isize);
                let target = if self.is_empty(xi, yi + 1) {
                    Some(x)
                } else if self.is_empty(xi + 1, yi + 1) && self.is_empty(xi - 1, yi + 1) {
                    Some(if self.rng.gen_bool(0.5) { x + 1 } else { x - 1 })
                } else if self.is_empty(xi + 1, yi + 1) && self.is_empty(xi + 1, yi) {
                    Some(x + 1)
                } else if self.is_empty(xi - 1, yi + 1) && self.is_empty(xi - 1, yi) {
                    Some(x - 1)
                } else {
                    None
                };

                if let Some(tx) = target {
                    self.current.set(tx, y + 1, grain);
                    self.current.set(x, y, EMPTY);
                }
            }
        }
    }

    /// Keep the pile above the obstacle from reaching the spawn point: when a column
    /// over the obstacle and both its neighbours are packed all the way up, free the
    /// top cell of that column.
    fn relieve_overflow(&mut self) {
        let Some(obstacle) = self.config.obstacle else {
            return;
        };
        let width = self.current.width();
        let packed_rows = obstacle.y.min(self.current.height());
        let column_packed = |x: isize| {
            x < 0
                || x as usize >= width
                || (0..packed_rows).all(|y| self.current.get(x as usize, y) != EMPTY)
        };

        let full: Vec<usize> = obstacle
            .columns()
            .filter(|&x| x < width)
            .filter(|&x| {
                let xi = x as isize;
                column_packed(xi - 1) && column_packed(xi) && column_packed(xi + 1)
            })
            .collect();

        for x in full {
            if !self.is_obstacle(x, 0) {
                trace!(column = x, "sand column overflowing, clearing top cell");
                self.current.set(x, 0, EMPTY);
            }
        }
    }

    fn spawn(&mut self, time: f32) {
        let width = self.current.width();
        if width == 0 || self.current.height() == 0 || !self.roll(self.config.spawn_probability) {
            return;
        }
        let x = ((width / 2).saturating_sub(1) + self.rng.gen_range(0..2)).min(width - 1);
        let hue = hue_from_fraction(time * self.config.speed * HUE_DRIFT);
        self.place_grain(x, 0, hsv_to_565(hue, 255, 255));
    }

    fn step(&mut self, time: f32) {
        self.previous.copy_from(&self.current);
        self.drain();
        self.settle();
        self.relieve_overflow();
        self.spawn(time);
    }
}

impl Program for FallingSand {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        if self.cycles >= self.period {
            self.step(time);
            self.cycles = 0;
        }

        let frac = self.cycles as f32 / self.period as f32;
        for y in 0..self.current.height() {
            for x in 0..self.current.width() {
                let color = lerp_565(self.previous.get(x, y), self.current.get(x, y), frac);
                grid.set_565(x as i32, y as i32, color);
            }
        }

        self.cycles += 1;
    }
}
