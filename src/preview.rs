//! Offline preview: render a program to a numbered series of PNG files.
//!
//! Runs the same [`Animator`] the render thread uses, at a fixed frame rate, so any
//! program can be inspected on a machine without a panel attached.

use crate::PanelConfig;
use crate::config::AppConfig;
use crate::program::ProgramKind;
use crate::render::Animator;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewOptions {
    pub frames: u32,
    pub fps: u32,
    /// Output pixels per LED
    pub scale: u32,
    pub brightness: u8,
    /// Fixed seed for reproducible output; entropy when `None`
    pub seed: Option<u64>,
    pub out_dir: PathBuf,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            frames: 60,
            fps: 30,
            scale: 16,
            brightness: 100,
            seed: None,
            out_dir: PathBuf::from("preview"),
        }
    }
}

/// Path of frame `index` inside `dir`.
pub fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{index:04}.png"))
}

/// Render `options.frames` frames of `kind` and save each one as a PNG.
///
/// Returns the written paths in frame order.
pub fn render_preview(
    kind: ProgramKind,
    panel: PanelConfig,
    options: &PreviewOptions,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    fs::create_dir_all(&options.out_dir)?;

    let config = AppConfig {
        program: kind,
        brightness: options.brightness,
    };
    let mut animator = match options.seed {
        Some(seed) => Animator::seeded(panel, config, seed),
        None => Animator::new(panel, config),
    };
    let dt = 1.0 / options.fps.max(1) as f32;

    let mut written = Vec::with_capacity(options.frames as usize);
    for index in 0..options.frames {
        let frame = animator.tick(dt);
        let path = frame_path(&options.out_dir, index);
        frame.to_rgb_image(options.scale).save(&path)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    tracing::info!(
        "Rendered {} frames of {} to {}",
        written.len(),
        kind,
        options.out_dir.display()
    );
    Ok(written)
}
