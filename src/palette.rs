//! Fixed RGB565 color ramps, looked up by normalized intensity.

/// An immutable ordered color ramp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: &'static [u16],
}

/// Black through deep red and orange to white. 37 entries.
pub const FIRE: Palette = Palette::new(&[
    0x0000, 0x1820, 0x2860, 0x4060, 0x50A0, 0x60E0, 0x70E0, 0x8920, 0x9960, 0xA9E0, 0xBA20,
    0xC220, 0xDA60, 0xDAA0, 0xDAA0, 0xD2E0, 0xD2E0, 0xD321, 0xCB61, 0xCBA1, 0xCBE1, 0xCC22,
    0xC422, 0xC462, 0xC4A3, 0xBCE3, 0xBCE3, 0xBD24, 0xBD24, 0xBD65, 0xB565, 0xB5A5, 0xB5A6,
    0xCE6D, 0xDEF3, 0xEF78, 0xFFFF,
]);

/// Warm wax tones for the lava lamp. 8 entries.
pub const LAVA: Palette = Palette::new(&[
    0xC220, 0xD321, 0xCBA1, 0xCC22, 0xC462, 0xBCE3, 0xBD24, 0xBD65,
]);

impl Palette {
    pub const fn new(colors: &'static [u16]) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entry at `index`, clamped to the last one.
    pub fn get(&self, index: usize) -> u16 {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// Entry nearest to `normalized` in `[0, 1]`; out-of-range values clamp.
    pub fn lookup(&self, normalized: f32) -> u16 {
        let last = (self.colors.len() - 1) as f32;
        let index = (normalized * last).round().clamp(0.0, last);
        self.colors[index as usize]
    }

    pub fn first(&self) -> u16 {
        self.colors[0]
    }

    pub fn last(&self) -> u16 {
        self.colors[self.colors.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn palette_lengths() {
        assert_eq!(FIRE.len(), 37);
        assert_eq!(LAVA.len(), 8);
    }

    #[rstest]
    #[case(0.0, 0x0000)]
    #[case(1.0, 0xFFFF)]
    #[case(0.5, 0xCB61)] // round(0.5 * 36) = 18
    #[case(-3.0, 0x0000)]
    #[case(7.0, 0xFFFF)]
    #[case(f32::NAN, 0x0000)]
    fn fire_lookup(#[case] normalized: f32, #[case] expected: u16) {
        assert_eq!(FIRE.lookup(normalized), expected);
    }

    #[test]
    fn get_clamps_index() {
        assert_eq!(LAVA.get(100), 0xBD65);
        assert_eq!(LAVA.get(0), LAVA.first());
    }
}
