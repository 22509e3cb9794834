//! Frame driver and render thread.
//!
//! [`Animator`] owns the pixel grid and the one active program, advances it once per
//! tick and hands out brightness-scaled frames. It has no hardware dependency, so the
//! preview renderer and the tests drive it directly.
//!
//! With the `hardware` feature, [`render_loop`] runs an `Animator` on a dedicated
//! thread that owns the LED matrix. The `rpi-led-matrix` C library is not
//! thread-safe, so all matrix operations happen there; the async HTTP server talks to
//! it by sending [`RenderCommand`] values through an `mpsc` channel and reads back a
//! shared [`DisplayStatus`].
//!
//! ## Rust concepts
//! - `Box<dyn Program>` for swapping programs at runtime
//! - `std::sync::mpsc` channels for thread communication
//! - `Arc<Mutex<T>>` for shared mutable state
//! - `try_recv()` for non-blocking channel reads between frames

use crate::PanelConfig;
use crate::config::{AppConfig, MAX_BRIGHTNESS};
use crate::grid::PixelGrid;
use crate::program::{Program, ProgramKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Current per fully lit color channel of one LED.
pub const AMPS_PER_CHANNEL: f32 = 0.02;
pub const SUPPLY_VOLTS: f32 = 5.0;
pub const DEFAULT_FPS: u32 = 60;

// ── Commands ─────────────────────────────────────────────────────────

/// Commands sent from the HTTP server to the render thread.
///
/// Rust concept: ENUMS WITH DATA
/// Each variant carries exactly the data it needs, and the compiler makes sure the
/// render thread handles every one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// Switch to another program (also resumes a stopped display)
    SelectProgram(ProgramKind),
    /// Set display brightness (0-100)
    SetBrightness(u8),
    /// Blank the display and stop animating
    Stop,
}

// ── Status ───────────────────────────────────────────────────────────

/// What the display is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Running,
    Idle,
}

/// Shared status that the HTTP server reads to report current state.
///
/// Rust concept: Arc<Mutex<T>>
/// The render thread updates this once per frame while HTTP handlers read it; the
/// mutex makes sure nobody sees a half-written status.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    /// Current display state
    pub state: DisplayState,
    /// Active program
    pub program: ProgramKind,
    /// Current brightness (0-100)
    pub brightness: u8,
    /// Frames rendered by the active program
    pub frame: u64,
    /// Estimated power draw of the last frame, in watts
    pub power_draw_watts: f32,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: DisplayState::Running,
            program: config.program,
            brightness: config.brightness,
            frame: 0,
            power_draw_watts: 0.0,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Copy the animator's view of the world into the status.
    pub fn sync(&mut self, animator: &Animator, state: DisplayState) {
        self.state = state;
        self.program = animator.kind();
        self.brightness = animator.brightness();
        self.frame = animator.frames();
        self.power_draw_watts = match state {
            DisplayState::Running => animator.power_draw_watts(),
            DisplayState::Idle => 0.0,
        };
    }
}

// ── Animator ─────────────────────────────────────────────────────────

/// Drives the active program one frame at a time.
pub struct Animator {
    panel: PanelConfig,
    grid: PixelGrid,
    kind: ProgramKind,
    program: Box<dyn Program>,
    brightness: u8,
    elapsed: f32,
    frames: u64,
    rng: StdRng,
}

impl Animator {
    /// An animator whose programs draw their randomness from OS entropy.
    pub fn new(panel: PanelConfig, config: AppConfig) -> Self {
        Self::with_rng(panel, config, StdRng::from_entropy())
    }

    /// An animator that replays identically for the same seed.
    pub fn seeded(panel: PanelConfig, config: AppConfig, seed: u64) -> Self {
        Self::with_rng(panel, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(panel: PanelConfig, config: AppConfig, mut rng: StdRng) -> Self {
        let program = config.program.build(panel, StdRng::seed_from_u64(rng.r#gen()));
        Self {
            panel,
            grid: PixelGrid::from_panel(panel),
            kind: config.program,
            program,
            brightness: config.brightness.min(MAX_BRIGHTNESS),
            elapsed: 0.0,
            frames: 0,
            rng,
        }
    }

    /// Replace the active program with a fresh instance of `kind` and blank the grid.
    /// Selecting the program that is already running restarts it.
    pub fn select(&mut self, kind: ProgramKind) {
        let seed = self.rng.r#gen();
        self.program = kind.build(self.panel, StdRng::seed_from_u64(seed));
        self.kind = kind;
        self.grid.clear();
        self.elapsed = 0.0;
        self.frames = 0;
        tracing::info!("Program selected: {}", kind);
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness.min(MAX_BRIGHTNESS);
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds of animation time the active program has seen.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            program: self.kind,
            brightness: self.brightness,
        }
    }

    /// The grid exactly as the program left it, before brightness.
    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// Advance the program by one frame that lasts `dt` seconds and return the
    /// frame to display.
    pub fn tick(&mut self, dt: f32) -> PixelGrid {
        self.program.advance(&mut self.grid, self.elapsed);
        self.elapsed += dt;
        self.frames += 1;
        self.frame()
    }

    /// The current frame with brightness applied. Program state is untouched, so
    /// dimming never feeds back into programs that read their own previous frame.
    pub fn frame(&self) -> PixelGrid {
        self.grid.with_brightness(self.brightness)
    }

    pub fn power_draw_watts(&self) -> f32 {
        self.frame().power_draw(AMPS_PER_CHANNEL, SUPPLY_VOLTS)
    }

    /// Apply a command from the server. Returns the settings to persist when the
    /// command changed them.
    pub fn apply(&mut self, cmd: RenderCommand, state: &mut DisplayState) -> Option<AppConfig> {
        match cmd {
            RenderCommand::SelectProgram(kind) => {
                self.select(kind);
                *state = DisplayState::Running;
                Some(self.config())
            }
            RenderCommand::SetBrightness(value) => {
                let before = self.brightness;
                self.set_brightness(value);
                tracing::info!("Brightness set to {}", self.brightness);
                (before != self.brightness).then(|| self.config())
            }
            RenderCommand::Stop => {
                self.grid.clear();
                *state = DisplayState::Idle;
                tracing::info!("Display stopped");
                None
            }
        }
    }
}

// ── Render loop ──────────────────────────────────────────────────────

#[cfg(feature = "hardware")]
pub use hardware::{RenderOptions, render_loop};

#[cfg(feature = "hardware")]
mod hardware {
    use super::*;
    use crate::{create_matrix, is_running};
    use rpi_led_matrix::LedCanvas;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc::{Receiver, TryRecvError};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    pub struct RenderOptions {
        pub panel: PanelConfig,
        pub fps: u32,
        /// Where selection and brightness changes are saved
        pub config_path: PathBuf,
    }

    fn draw_to_canvas(canvas: &mut LedCanvas, frame: &PixelGrid) {
        for (x, y, color) in frame.iter() {
            canvas.set(x as i32, y as i32, &color.into());
        }
    }

    /// Main render loop. Runs on a dedicated thread and owns the LED matrix.
    ///
    /// Returns when Ctrl+C clears `running` or the command channel closes, after
    /// blanking the panel. Commands are drained with `try_recv()` between frames so
    /// a slow client never stalls the animation.
    pub fn render_loop(
        rx: Receiver<RenderCommand>,
        status: Arc<Mutex<DisplayStatus>>,
        latest_frame: Arc<Mutex<Vec<u8>>>,
        running: Arc<AtomicBool>,
        options: RenderOptions,
    ) {
        let matrix = match create_matrix(options.panel) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!("Failed to initialize LED matrix: {}", e);
                return;
            }
        };
        let mut canvas = matrix.offscreen_canvas();

        let config = AppConfig::load_or_default(&options.config_path);
        let mut animator = Animator::new(options.panel, config);
        let mut state = DisplayState::Running;
        let frame_duration = Duration::from_secs_f32(1.0 / options.fps.max(1) as f32);
        let mut last_frame = Instant::now();
        let mut slow_frame_count = 0u32;

        tracing::info!(
            "Render thread started: {} at {} fps, brightness {}",
            animator.kind(),
            options.fps,
            animator.brightness()
        );

        'render: while is_running(&running) {
            let frame_start = Instant::now();

            loop {
                match rx.try_recv() {
                    Ok(cmd) => {
                        if let Some(changed) = animator.apply(cmd, &mut state) {
                            if let Err(e) = changed.save(&options.config_path) {
                                tracing::warn!(
                                    "Failed to save config {}: {}",
                                    options.config_path.display(),
                                    e
                                );
                            }
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::info!("Render thread: channel closed, shutting down.");
                        break 'render;
                    }
                }
            }

            let frame = match state {
                DisplayState::Running => {
                    let dt = last_frame.elapsed().as_secs_f32();
                    animator.tick(dt)
                }
                DisplayState::Idle => PixelGrid::from_panel(options.panel),
            };
            last_frame = Instant::now();

            draw_to_canvas(&mut canvas, &frame);
            canvas = matrix.swap(canvas);

            status.lock().unwrap().sync(&animator, state);
            *latest_frame.lock().unwrap() = frame.to_rgb_bytes();

            let frame_time = frame_start.elapsed();
            if frame_time > frame_duration {
                slow_frame_count += 1;
                if slow_frame_count <= 5 {
                    tracing::warn!(
                        "Frame {} took {}ms (target: {}ms)",
                        animator.frames(),
                        frame_time.as_millis(),
                        frame_duration.as_millis()
                    );
                }
            } else {
                thread::sleep(frame_duration - frame_time);
            }
        }

        canvas.clear();
        let _ = matrix.swap(canvas);
        status.lock().unwrap().state = DisplayState::Idle;
        if slow_frame_count > 0 {
            tracing::warn!("{} slow frames during this run", slow_frame_count);
        }
        tracing::info!("Render thread stopped, panel blanked.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;

    fn animator(program: ProgramKind, brightness: u8) -> Animator {
        Animator::seeded(PanelConfig::default(), AppConfig { program, brightness }, 7)
    }

    #[test]
    fn tick_counts_frames_and_time() {
        let mut a = animator(ProgramKind::Spectral, 100);
        for _ in 0..3 {
            a.tick(0.5);
        }
        assert_eq!(a.frames(), 3);
        assert_eq!(a.elapsed(), 1.5);
    }

    #[test]
    fn brightness_scales_the_frame_only() {
        let mut a = animator(ProgramKind::Static, 50);
        let frame = a.tick(1.0 / 60.0);
        let raw = a.grid().get(0, 0);
        assert_eq!(frame.get(0, 0), raw.apply_brightness(50));
        assert_ne!(raw, raw.apply_brightness(50));
    }

    #[test]
    fn brightness_is_capped_at_100() {
        let mut a = animator(ProgramKind::Static, 100);
        a.set_brightness(180);
        assert_eq!(a.brightness(), 100);
    }

    #[test]
    fn select_clears_and_restarts() {
        let mut a = animator(ProgramKind::Static, 100);
        a.tick(0.1);
        a.select(ProgramKind::Ripples);
        assert_eq!(a.kind(), ProgramKind::Ripples);
        assert_eq!(a.frames(), 0);
        assert_eq!(a.elapsed(), 0.0);
        assert!(a.grid().wire_order().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn same_seed_same_frames() {
        let mut a = animator(ProgramKind::LavaLamp, 100);
        let mut b = animator(ProgramKind::LavaLamp, 100);
        for _ in 0..20 {
            assert_eq!(a.tick(1.0 / 60.0), b.tick(1.0 / 60.0));
        }
    }

    #[test]
    fn commands_report_what_to_persist() {
        let mut a = animator(ProgramKind::Static, 75);
        let mut state = DisplayState::Running;

        assert_eq!(a.apply(RenderCommand::Stop, &mut state), None);
        assert_eq!(state, DisplayState::Idle);

        let saved = a.apply(RenderCommand::SelectProgram(ProgramKind::Fire), &mut state);
        assert_eq!(state, DisplayState::Running);
        assert_eq!(saved, Some(AppConfig { program: ProgramKind::Fire, brightness: 75 }));

        assert_eq!(a.apply(RenderCommand::SetBrightness(75), &mut state), None);
        let saved = a.apply(RenderCommand::SetBrightness(20), &mut state);
        assert_eq!(saved.map(|c| c.brightness), Some(20));
    }

    #[test]
    fn status_tracks_animator() {
        let mut a = animator(ProgramKind::Static, 100);
        a.tick(0.1);
        let mut status = DisplayStatus::new(a.config());
        status.sync(&a, DisplayState::Running);
        assert_eq!(status.frame, 1);
        assert!(status.power_draw_watts > 0.0);

        status.sync(&a, DisplayState::Idle);
        assert_eq!(status.power_draw_watts, 0.0);
    }
}
