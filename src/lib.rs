//! Procedural animations for serpentine-wired RGB LED matrices.
//!
//! The crate is split into:
//! - the animation core: [`color`], [`blur`], [`palette`], [`value_map`], [`noise`],
//!   [`grid`] and the [`program`] family
//! - the frame driver ([`render::Animator`]) and, with the `hardware` feature, the
//!   render thread that owns the physical panel
//! - the HTTP control API ([`server`]), persisted settings ([`config`]) and the
//!   offline PNG [`preview`]
//!
//! Everything except the render thread and matrix setup builds and tests without
//! `rpi-led-matrix`.

pub mod blur;
pub mod color;
pub mod config;
pub mod grid;
pub mod noise;
pub mod palette;
pub mod preview;
pub mod program;
pub mod render;
pub mod server;
pub mod value_map;

pub use color::Color;

#[cfg(feature = "hardware")]
use rpi_led_matrix::{LedMatrix, LedMatrixOptions, LedRuntimeOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Panel configuration ────────────────────────────────────────────

/// Dimensions of the LED panel.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (it's just two u32s), so it is passed
/// by value everywhere instead of through a shared global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub rows: u32,
    pub cols: u32,
}

impl PanelConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of bytes in a raw RGB frame (3 bytes per pixel).
    pub fn frame_byte_count(&self) -> usize {
        (self.rows * self.cols * 3) as usize
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { rows: 16, cols: 16 }
    }
}

// ── Matrix initialization ──────────────────────────────────────────

/// Create a matrix for a Pi driving a small WS2812-style panel through the
/// Adafruit bonnet.
///
/// # Rust concept: Result and the ? operator
/// Matrix initialization can fail (not running as root, GPIO unavailable), so the
/// error is propagated to the caller with `?` instead of panicking here.
#[cfg(feature = "hardware")]
pub fn create_matrix(panel: PanelConfig) -> Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut options = LedMatrixOptions::new();
    options.set_rows(panel.rows);
    options.set_cols(panel.cols);
    options.set_hardware_mapping("adafruit-hat");

    options.set_pwm_bits(8)?;
    options.set_pwm_lsb_nanoseconds(130);

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

    let matrix = LedMatrix::new(Some(options), Some(rt_options))?;

    Ok(matrix)
}

/// Set up a Ctrl+C handler that clears the returned flag.
///
/// # Rust concept: Arc and AtomicBool
/// The flag is shared between the render loop and the signal handler. `Arc` gives
/// both shared ownership and `AtomicBool` makes the single bool thread-safe without
/// a mutex.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Whether the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
