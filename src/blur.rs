//! 3×3 Gaussian smoothing with an integer kernel.

use crate::color::Color;
use crate::grid::{PixelGrid, n_to_xy};

/// Added before truncating each normalized weight, so 1.9999 becomes 2 and not 1.
const KERNEL_ROUNDING_BIAS: f64 = 0.01;
/// Largest integer weight a tap may have. Keeps `Σ weight × 255` inside `u64`.
/// Only sigmas below about 0.17 reach it.
const MAX_TAP_WEIGHT: f64 = (1u64 << 48) as f64;
/// Sigmas below this are treated as this value.
const MIN_SIGMA: f64 = 1e-6;
/// Squared distance of the corner taps, which carry the smallest weight.
const CORNER_DIST_SQ: f64 = 2.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvolutionFilter {
    kernel: [[u64; 3]; 3],
    sum: u64,
}

impl ConvolutionFilter {
    /// Sample a 2D Gaussian of width `sigma` at the nine taps and normalize so the
    /// weakest (corner) tap is 1.
    ///
    /// Ratios are computed relative to the corner in log space. Only when the center
    /// would exceed `MAX_TAP_WEIGHT` are all taps scaled down together, so a tiny
    /// sigma degrades to an identity-like kernel instead of overflowing.
    pub fn new(sigma: f32) -> Self {
        let sigma = (sigma as f64).max(MIN_SIGMA);
        let two_sigma_sq = 2.0 * sigma * sigma;
        let log_ratio = |dist_sq: f64| (CORNER_DIST_SQ - dist_sq) / two_sigma_sq;
        let shift = (log_ratio(0.0) - MAX_TAP_WEIGHT.ln()).max(0.0);

        let mut kernel = [[0u64; 3]; 3];
        let mut sum = 0;
        for (j, row) in kernel.iter_mut().enumerate() {
            for (i, tap) in row.iter_mut().enumerate() {
                let dx = i as f64 - 1.0;
                let dy = j as f64 - 1.0;
                let weight = (log_ratio(dx * dx + dy * dy) - shift).exp();
                *tap = (weight + KERNEL_ROUNDING_BIAS) as u64;
                sum += *tap;
            }
        }

        Self { kernel, sum }
    }

    pub fn kernel(&self) -> &[[u64; 3]; 3] {
        &self.kernel
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Blur the grid in one pass. Taps are read from a snapshot of the input, walking
    /// the strip in wiring order; taps past an edge reuse the nearest edge pixel.
    pub fn apply(&self, grid: &mut PixelGrid) {
        if self.sum == 0 || grid.is_empty() {
            return;
        }
        let source = grid.clone();
        let width = grid.width();

        for n in 0..grid.len() {
            let (x, y) = n_to_xy(n, width);
            let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
            for (j, row) in self.kernel.iter().enumerate() {
                for (i, &weight) in row.iter().enumerate() {
                    let tap = source.get_clamped(x as i32 + i as i32 - 1, y as i32 + j as i32 - 1);
                    r += weight * tap.r as u64;
                    g += weight * tap.g as u64;
                    b += weight * tap.b as u64;
                }
            }
            grid.set_index(
                n,
                Color::new(
                    (r / self.sum) as u8,
                    (g / self.sum) as u8,
                    (b / self.sum) as u8,
                ),
            );
        }
    }
}
