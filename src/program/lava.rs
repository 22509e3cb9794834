//! Lava lamp built from metaballs.
//!
//! Each ball heats up while it sits near the bottom of the panel, which lifts it
//! against gravity, and cools off higher up until it sinks again. Balls repel each
//! other with an inverse-square force and are nudged away from the side walls. The
//! rendered field is the sum of `radius / distance²` over all balls, thresholded into
//! wax colors over a blue background.

use super::Program;
use crate::color::pack_565;
use crate::grid::PixelGrid;
use crate::palette::LAVA;
use rand::Rng;
use std::f32::consts::TAU;

const HEAT_ABSORPTION: f32 = 5e-6;
/// Negative, so balls push each other apart.
const ATTRACTION: f32 = -1e-2;
const WALL_REPEL: f32 = 5e-6;
/// Balls below this fraction of the panel height are being heated.
const HEATING_ZONE: f32 = 0.8;
const VERTICAL_DRAG: f32 = 0.995;
const HORIZONTAL_DRAG: f32 = 0.95;
const VERTICAL_BOUNCE: f32 = -0.33;
/// Virtual wall positions used by the repulsion term, slightly outside the panel.
const LEFT_WALL: f32 = -2.05;
const RIGHT_WALL_SCALE: f32 = 1.05;
/// Squared distance floor for ball to ball forces.
const MIN_PAIR_DIST_SQ: f32 = 1.0;
/// Squared distance floor when sampling the field.
const MIN_FIELD_DIST_SQ: f32 = 1e-6;
const FIELD_CEILING: f32 = 255.0;
const BAND_MIN: f32 = 0.2;
const BAND_MAX: f32 = 0.9;
/// Relative spread of ball radii around the configured radius.
const RADIUS_JITTER: f32 = 0.1;
const BACKGROUND: u16 = pack_565(0, 0, 168);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LavaLampConfig {
    /// Initial ball speed, in pixels per frame.
    pub speed: f32,
    pub balls: usize,
    pub radius: f32,
    pub gravity: f32,
}

impl Default for LavaLampConfig {
    fn default() -> Self {
        Self {
            speed: 0.05,
            balls: 5,
            radius: 300.0,
            gravity: 1e-3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub heat: f32,
}

impl Ball {
    /// A cold ball at rest.
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
            heat: 0.0,
        }
    }

    /// Heat, gravity, drag, wall repulsion and bounds for one frame. Position is
    /// integrated separately once every ball has felt the others.
    fn update(&mut self, gravity: f32, max_x: f32, max_y: f32) {
        if self.y > max_y * HEATING_ZONE {
            self.heat += HEAT_ABSORPTION;
        } else {
            self.heat = (self.heat - HEAT_ABSORPTION).max(0.0);
        }

        self.vy += gravity - self.heat;
        self.vy *= VERTICAL_DRAG;
        self.vx *= HORIZONTAL_DRAG;

        let right_wall = max_x * RIGHT_WALL_SCALE;
        let wall_push = (self.x - LEFT_WALL).powi(2) - (right_wall - self.x).powi(2);
        self.vx -= wall_push * WALL_REPEL;

        if self.x <= 0.0 || self.x >= max_x {
            self.x = self.x.clamp(0.0, max_x);
            self.vx = -self.vx;
        }
        if self.y <= 0.0 || self.y >= max_y {
            self.y = self.y.clamp(0.0, max_y);
            self.vy *= VERTICAL_BOUNCE;
        }
    }

    fn feel(&mut self, other: &Ball) {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dist_sq = (dx * dx + dy * dy).max(MIN_PAIR_DIST_SQ);
        let angle = dy.atan2(dx);
        self.vx += ATTRACTION * angle.cos() / dist_sq;
        self.vy += ATTRACTION * angle.sin() / dist_sq;
    }

    fn field_at(&self, x: f32, y: f32) -> f32 {
        let dist_sq = (x - self.x).powi(2) + (y - self.y).powi(2);
        self.radius / dist_sq.max(MIN_FIELD_DIST_SQ)
    }
}

pub struct LavaLamp {
    gravity: f32,
    width: usize,
    height: usize,
    balls: Vec<Ball>,
}

impl LavaLamp {
    pub fn new<R: Rng + ?Sized>(
        config: LavaLampConfig,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Self {
        let span_x = width.saturating_sub(3).max(1);
        let span_y = height.saturating_sub(3).max(1);
        let balls = (0..config.balls)
            .map(|_| {
                let radius = config.radius * (1.0 + rng.gen_range(-RADIUS_JITTER..=RADIUS_JITTER));
                let x = (1 + rng.gen_range(0..span_x)) as f32;
                let y = (1 + rng.gen_range(0..span_y)) as f32;
                let heading = rng.gen_range(0.0..TAU);
                Ball {
                    vx: config.speed * heading.cos(),
                    vy: config.speed * heading.sin(),
                    ..Ball::new(x, y, radius)
                }
            })
            .collect();
        Self::with_balls(config, width, height, balls)
    }

    pub fn with_balls(config: LavaLampConfig, width: usize, height: usize, balls: Vec<Ball>) -> Self {
        Self {
            gravity: config.gravity,
            width,
            height,
            balls,
        }
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    fn step(&mut self) {
        let (max_x, max_y) = (self.width as f32, self.height as f32);
        for ball in &mut self.balls {
            ball.update(self.gravity, max_x, max_y);
        }

        let snapshot = self.balls.clone();
        for (i, ball) in self.balls.iter_mut().enumerate() {
            for (j, other) in snapshot.iter().enumerate() {
                if i != j {
                    ball.feel(other);
                }
            }
        }

        for ball in &mut self.balls {
            ball.x += ball.vx;
            ball.y += ball.vy;
        }
    }

    fn color_at(&self, x: f32, y: f32) -> u16 {
        let field: f32 = self.balls.iter().map(|b| b.field_at(x, y)).sum();
        let intensity = field.min(FIELD_CEILING) / FIELD_CEILING;

        if BAND_MIN < intensity && intensity < BAND_MAX {
            let position = (intensity - BAND_MIN) / (BAND_MAX - BAND_MIN);
            let index = (position * LAVA.len() as f32 - 1.0).clamp(0.0, (LAVA.len() - 1) as f32);
            LAVA.get(index as usize)
        } else if intensity > BAND_MAX {
            LAVA.last()
        } else {
            BACKGROUND
        }
    }
}

impl Program for LavaLamp {
    fn advance(&mut self, grid: &mut PixelGrid, _time: f32) {
        self.step();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let color = self.color_at(x as f32, y as f32);
                grid.set_565(x as i32, y as i32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn weightless() -> LavaLampConfig {
        LavaLampConfig {
            gravity: 0.0,
            ..LavaLampConfig::default()
        }
    }

    #[test]
    fn balls_spawn_inside_the_panel() {
        let lamp = LavaLamp::new(LavaLampConfig::default(), 16, 16, &mut StdRng::seed_from_u64(8));
        assert_eq!(lamp.balls().len(), 5);
        for ball in lamp.balls() {
            assert!((1.0..14.0).contains(&ball.x));
            assert!((1.0..14.0).contains(&ball.y));
            assert!((269.9..=330.1).contains(&ball.radius));
            assert!(((ball.vx.powi(2) + ball.vy.powi(2)).sqrt() - 0.05).abs() < 1e-4);
        }
    }

    #[test]
    fn balls_at_equal_height_push_apart() {
        let balls = vec![Ball::new(6.375, 8.0, 300.0), Ball::new(8.375, 8.0, 300.0)];
        let mut lamp = LavaLamp::with_balls(weightless(), 16, 16, balls);
        let mut grid = PixelGrid::new(16, 16);
        for frame in 0..50 {
            lamp.advance(&mut grid, frame as f32);
        }
        let [a, b] = [lamp.balls()[0], lamp.balls()[1]];
        assert!(b.x - a.x > 2.0, "{} vs {}", a.x, b.x);
        assert!((a.y - 8.0).abs() < 1e-3);
        assert!((b.y - 8.0).abs() < 1e-3);
    }

    #[test]
    fn bottom_heats_and_top_cools() {
        let balls = vec![Ball::new(8.0, 15.0, 300.0), Ball::new(8.0, 2.0, 300.0)];
        let mut lamp = LavaLamp::with_balls(weightless(), 16, 16, balls);
        lamp.step();
        assert_eq!(lamp.balls()[0].heat, HEAT_ABSORPTION);
        assert_eq!(lamp.balls()[1].heat, 0.0);
    }

    #[test]
    fn ball_bounces_off_the_floor() {
        let mut ball = Ball::new(8.0, 17.0, 300.0);
        ball.vy = 0.5;
        ball.update(0.0, 16.0, 16.0);
        assert_eq!(ball.y, 16.0);
        assert!(ball.vy < 0.0);
    }

    #[test]
    fn field_renders_core_band_and_background() {
        let lamp = LavaLamp::with_balls(weightless(), 16, 16, vec![Ball::new(8.0, 8.0, 300.0)]);
        let mut grid = PixelGrid::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                grid.set_565(x, y, lamp.color_at(x as f32, y as f32));
            }
        }
        assert_eq!(grid.get(8, 8), Color::from_565(LAVA.last()));
        assert_eq!(grid.get(0, 0), Color::from_565(BACKGROUND));
        // d² = 4: 75 / 255 = 0.29 falls in the band
        assert_eq!(grid.get(10, 8), Color::from_565(LAVA.get(0)));
    }

    #[test]
    fn band_edges_are_exclusive() {
        // 229.5 / 255 is exactly the upper edge, 51 / 255 the lower one
        let upper = LavaLamp::with_balls(weightless(), 4, 4, vec![Ball::new(0.0, 0.0, 229.5)]);
        assert_eq!(upper.color_at(1.0, 0.0), BACKGROUND);
        let lower = LavaLamp::with_balls(weightless(), 4, 4, vec![Ball::new(0.0, 0.0, 51.0)]);
        assert_eq!(lower.color_at(1.0, 0.0), BACKGROUND);

        let hot = LavaLamp::with_balls(weightless(), 4, 4, vec![Ball::new(0.0, 0.0, 230.0)]);
        assert_eq!(hot.color_at(1.0, 0.0), LAVA.last());
    }
}
