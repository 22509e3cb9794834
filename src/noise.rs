//! Gradient noise used by the fire and plasma programs.
//!
//! Programs only depend on the [`Noise`] trait; [`PerlinNoise`] is the default
//! implementation, seeded from a random generator so every program instance gets
//! its own field.

use rand::Rng;
use rand::seq::SliceRandom;

/// A smooth pseudo-random field. Every method returns values in `[-1, 1]`.
pub trait Noise {
    fn noise1(&self, x: f32) -> f32;

    fn noise3(&self, x: f32, y: f32, z: f32) -> f32;

    fn noise2(&self, x: f32, y: f32) -> f32;

    /// Fractal sum of `octaves` layers of 2D noise. Each layer doubles the frequency
    /// and multiplies the amplitude by `persistence`; the result is renormalized.
    fn noise2_octaves(&self, x: f32, y: f32, octaves: u32, persistence: f32) -> f32 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            sum += amplitude * self.noise2(x * frequency, y * frequency);
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        sum / max_amplitude
    }
}

/// Classic Perlin noise over a shuffled permutation table.
#[derive(Clone, Debug)]
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    fn hash(&self, i: i32) -> i32 {
        self.perm[(i & 255) as usize] as i32
    }
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

fn grad1(hash: i32, x: f32) -> f32 {
    if hash & 1 == 0 { x } else { -x }
}

fn grad2(hash: i32, x: f32, y: f32) -> f32 {
    match hash & 3 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        _ => -x - y,
    }
}

fn grad3(hash: i32, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

impl Noise for PerlinNoise {
    fn noise1(&self, x: f32) -> f32 {
        let xi = x.floor() as i32;
        let xf = x - x.floor();
        let u = fade(xf);

        // Scaled so the 1D gradients (slope ±1) can reach the full range.
        let value = 2.0 * lerp(u, grad1(self.hash(xi), xf), grad1(self.hash(xi + 1), xf - 1.0));
        value.clamp(-1.0, 1.0)
    }

    fn noise2(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        let xf = x - x.floor();
        let yf = y - y.floor();
        let u = fade(xf);
        let v = fade(yf);

        let aa = self.hash(self.hash(xi) + yi);
        let ab = self.hash(self.hash(xi) + yi + 1);
        let ba = self.hash(self.hash(xi + 1) + yi);
        let bb = self.hash(self.hash(xi + 1) + yi + 1);

        let value = lerp(
            v,
            lerp(u, grad2(aa, xf, yf), grad2(ba, xf - 1.0, yf)),
            lerp(u, grad2(ab, xf, yf - 1.0), grad2(bb, xf - 1.0, yf - 1.0)),
        );
        value.clamp(-1.0, 1.0)
    }

    fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        let zi = z.floor() as i32;
        let xf = x - x.floor();
        let yf = y - y.floor();
        let zf = z - z.floor();
        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let a = self.hash(xi) + yi;
        let aa = self.hash(a) + zi;
        let ab = self.hash(a + 1) + zi;
        let b = self.hash(xi + 1) + yi;
        let ba = self.hash(b) + zi;
        let bb = self.hash(b + 1) + zi;

        let value = lerp(
            w,
            lerp(
                v,
                lerp(u, grad3(self.hash(aa), xf, yf, zf), grad3(self.hash(ba), xf - 1.0, yf, zf)),
                lerp(
                    u,
                    grad3(self.hash(ab), xf, yf - 1.0, zf),
                    grad3(self.hash(bb), xf - 1.0, yf - 1.0, zf),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad3(self.hash(aa + 1), xf, yf, zf - 1.0),
                    grad3(self.hash(ba + 1), xf - 1.0, yf, zf - 1.0),
                ),
                lerp(
                    u,
                    grad3(self.hash(ab + 1), xf, yf - 1.0, zf - 1.0),
                    grad3(self.hash(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
                ),
            ),
        );
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noise() -> PerlinNoise {
        PerlinNoise::new(&mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn lattice_points_are_zero() {
        let n = noise();
        assert_eq!(n.noise1(3.0), 0.0);
        assert_eq!(n.noise2(2.0, 5.0), 0.0);
        assert_eq!(n.noise3(1.0, 2.0, 3.0), 0.0);
    }

    #[test]
    fn values_stay_in_range() {
        let n = noise();
        for i in 0..2000 {
            let t = i as f32 * 0.173;
            for v in [
                n.noise1(t),
                n.noise2(t, t * 0.7),
                n.noise3(t, -t * 0.3, t * 1.9),
                n.noise2_octaves(t, t * 0.4, 3, 0.5),
            ] {
                assert!((-1.0..=1.0).contains(&v), "{v} out of range at {t}");
            }
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = noise();
        let b = noise();
        assert_eq!(a.noise3(0.3, 1.7, 9.2), b.noise3(0.3, 1.7, 9.2));
    }

    #[test]
    fn field_is_continuous() {
        let n = noise();
        let a = n.noise2(4.31, 7.77);
        let b = n.noise2(4.3101, 7.7701);
        assert!((a - b).abs() < 0.01);
    }
}
