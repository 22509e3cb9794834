//! Color model: HSV conversion, packed 16-bit (RGB565) and 24-bit (RGB888) encodings.
//!
//! Programs mostly think in RGB565 because that is what the palettes are written in,
//! while the pixel grid stores full 8-bit channels. The conversions here are bit-exact
//! integer routines; the visual output depends on their particular rounding, so the
//! magic numbers are named rather than "simplified".

use serde::{Deserialize, Serialize};

/// Width of the hexagonal hue ramp: six segments of 255 steps each.
const HUE_RAMP: u32 = 1530;
/// Half of the 16-bit hue range; centers pure red on the 0/65535 rollover.
const HUE_ROUNDING: u32 = 32768;

/// Multipliers used to replicate 5/6-bit channels up to 8 bits with minimal error.
const EXPAND_5_MUL: u32 = 527;
const EXPAND_5_BIAS: u32 = 23;
const EXPAND_6_MUL: u32 = 259;
const EXPAND_6_BIAS: u32 = 33;
const EXPAND_SHIFT: u32 = 6;

/// A 24-bit color, decoupled from any hardware crate.
///
/// At the hardware boundary we convert via `Into<LedColor>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub const fn from_888(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    pub const fn to_888(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn from_565(packed: u16) -> Self {
        Self::from_888(expand_565(packed))
    }

    pub const fn to_565(self) -> u16 {
        pack_565(self.r, self.g, self.b)
    }

    /// Apply brightness scaling (0-100) to this color.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness >= 100 {
            return self;
        }
        Self {
            r: ((self.r as u16 * brightness as u16) / 100) as u8,
            g: ((self.g as u16 * brightness as u16) / 100) as u8,
            b: ((self.b as u16 * brightness as u16) / 100) as u8,
        }
    }

    /// Multiply every channel by `factor`, rounding. Results saturate at 0 and 255.
    pub fn scale(self, factor: f32) -> Self {
        let s = |v: u8| (v as f32 * factor).round() as u8;
        Self {
            r: s(self.r),
            g: s(self.g),
            b: s(self.b),
        }
    }

    /// Sum of all three channels, used by power estimates and the fade snap.
    pub fn channel_sum(self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }
}

/// Convert our Color to the hardware crate's LedColor at the boundary.
#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        rpi_led_matrix::LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

/// Pack 8-bit channels into RGB565 by dropping the low bits.
pub const fn pack_565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Convert hue (0-65535, wrapping), saturation and value to RGB565.
///
/// Hue 0 and 65535 are both pure red: red is centered on the rollover, so hue can
/// wrap freely in either direction.
pub fn hsv_to_565(hue: u16, sat: u8, val: u8) -> u16 {
    let hue = (hue as u32 * HUE_RAMP + HUE_ROUNDING) >> 16;

    let (r, g, b): (u32, u32, u32) = if hue < 510 {
        if hue < 255 { (255, hue, 0) } else { (510 - hue, 255, 0) }
    } else if hue < 1020 {
        if hue < 765 { (0, 255, hue - 510) } else { (0, 1020 - hue, 255) }
    } else if hue < HUE_RAMP {
        if hue < 1275 { (hue - 1020, 0, 255) } else { (255, 0, HUE_RAMP - hue) }
    } else {
        (255, 0, 0)
    };

    // The +1 lets us shift by 8 instead of dividing by 255.
    let v1 = 1 + val as u32;
    let s1 = 1 + sat as u32;
    let s2 = 255 - sat as u32;

    let apply = |c: u32| (((((c * s1) >> 8) + s2) * v1) >> 8) as u8;
    pack_565(apply(r), apply(g), apply(b))
}

/// Hue as a fraction of a full turn, wrapped into `[0, 1)` and mapped onto 0-65535.
pub fn hue_from_fraction(fraction: f32) -> u16 {
    (fraction.rem_euclid(1.0) * 65536.0) as u32 as u16
}

/// Expand RGB565 to a packed `0xRRGGBB` value.
pub const fn expand_565(color: u16) -> u32 {
    let color = color as u32;
    let r = (((color >> 11) & 0x1F) * EXPAND_5_MUL + EXPAND_5_BIAS) >> EXPAND_SHIFT;
    let g = (((color >> 5) & 0x3F) * EXPAND_6_MUL + EXPAND_6_BIAS) >> EXPAND_SHIFT;
    let b = ((color & 0x1F) * EXPAND_5_MUL + EXPAND_5_BIAS) >> EXPAND_SHIFT;
    r << 16 | g << 8 | b
}

/// Compress a packed `0xRRGGBB` value to RGB565, truncating the low bits.
pub const fn compress_888(color: u32) -> u16 {
    (((color & 0xF8_0000) >> 8) | ((color & 0xFC00) >> 5) | ((color & 0xF8) >> 3)) as u16
}

/// Interpolate between two RGB565 colors in 8-bit space.
///
/// `frac` is not clamped; values outside `[0, 1]` extrapolate and saturate per channel.
pub fn lerp_565(a: u16, b: u16, frac: f32) -> u16 {
    let a = Color::from_888(expand_565(a));
    let b = Color::from_888(expand_565(b));
    let mix = |x: u8, y: u8| ((y as f32 - x as f32) * frac + x as f32) as u8;
    pack_565(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}
