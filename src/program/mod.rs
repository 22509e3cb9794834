//! Animation programs.
//!
//! A program owns whatever simulation state it needs and, once per frame, draws into
//! the shared [`PixelGrid`]. Exactly one program is active at a time; the driver
//! calls [`Program::advance`] with the elapsed time in seconds and then ships the
//! grid to the display.
//!
//! [`ProgramKind`] is the closed list of programs that can be selected from the CLI,
//! the HTTP API, or the persisted config.

pub mod fire;
pub mod lava;
pub mod plasma;
pub mod polar;
pub mod ripples;
pub mod sand;
pub mod tetrahedron;
pub mod trails;

use crate::PanelConfig;
use crate::grid::PixelGrid;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// One frame-advancing animation.
pub trait Program: Send {
    /// Advance the simulation to `time` (seconds since the program started) and draw
    /// the resulting frame into `grid`.
    fn advance(&mut self, grid: &mut PixelGrid, time: f32);
}

/// Number of frames between simulation steps for a given speed, never zero.
pub(crate) fn period_for_speed(speed: f32) -> u32 {
    (1.0 / speed).round().max(1.0) as u32
}

/// Every selectable program.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, utoipa::ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramKind {
    Static,
    Spectral,
    RainbowWave,
    RainbowPlasma,
    FirePlasma,
    Fire,
    FallingSand,
    LavaLamp,
    Ripples,
    MatrixRain,
    Vortex,
    Kaleidoscope,
    Octopus,
    Bursts,
    Lissajous,
    DnaSpiral,
    Tetrahedron,
    StretchyTetrahedron,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 18] = [
        ProgramKind::Static,
        ProgramKind::Spectral,
        ProgramKind::RainbowWave,
        ProgramKind::RainbowPlasma,
        ProgramKind::FirePlasma,
        ProgramKind::Fire,
        ProgramKind::FallingSand,
        ProgramKind::LavaLamp,
        ProgramKind::Ripples,
        ProgramKind::MatrixRain,
        ProgramKind::Vortex,
        ProgramKind::Kaleidoscope,
        ProgramKind::Octopus,
        ProgramKind::Bursts,
        ProgramKind::Lissajous,
        ProgramKind::DnaSpiral,
        ProgramKind::Tetrahedron,
        ProgramKind::StretchyTetrahedron,
    ];

    /// The name used on the command line, in the API and in the config file.
    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Static => "static",
            ProgramKind::Spectral => "spectral",
            ProgramKind::RainbowWave => "rainbow-wave",
            ProgramKind::RainbowPlasma => "rainbow-plasma",
            ProgramKind::FirePlasma => "fire-plasma",
            ProgramKind::Fire => "fire",
            ProgramKind::FallingSand => "falling-sand",
            ProgramKind::LavaLamp => "lava-lamp",
            ProgramKind::Ripples => "ripples",
            ProgramKind::MatrixRain => "matrix-rain",
            ProgramKind::Vortex => "vortex",
            ProgramKind::Kaleidoscope => "kaleidoscope",
            ProgramKind::Octopus => "octopus",
            ProgramKind::Bursts => "bursts",
            ProgramKind::Lissajous => "lissajous",
            ProgramKind::DnaSpiral => "dna-spiral",
            ProgramKind::Tetrahedron => "tetrahedron",
            ProgramKind::StretchyTetrahedron => "stretchy-tetrahedron",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ProgramKind::Static => "Solid color",
            ProgramKind::Spectral => "Whole panel cycling through the hue wheel",
            ProgramKind::RainbowWave => "Rainbow bands sweeping across the columns",
            ProgramKind::RainbowPlasma => "Noise-driven rainbow plasma",
            ProgramKind::FirePlasma => "Noise-driven plasma in fire colors",
            ProgramKind::Fire => "Convecting heat field cooled by noise",
            ProgramKind::FallingSand => "Colored sand piling around an obstacle",
            ProgramKind::LavaLamp => "Metaballs heated at the bottom, rising and sinking",
            ProgramKind::Ripples => "Expanding rings on a pond",
            ProgramKind::MatrixRain => "Green drops trailing down the panel",
            ProgramKind::Vortex => "Orbiting points leaving fading trails",
            ProgramKind::Kaleidoscope => "Eight-fold mirrored orbiting seeds",
            ProgramKind::Octopus => "Polar tentacle pattern",
            ProgramKind::Bursts => "Rays bursting from a wandering center",
            ProgramKind::Lissajous => "Lissajous curve trail",
            ProgramKind::DnaSpiral => "Double helix with rungs",
            ProgramKind::Tetrahedron => "Rotating tetrahedron in perspective",
            ProgramKind::StretchyTetrahedron => "Wobbling wireframe tetrahedron",
        }
    }

    /// Build the program with its default configuration for the given panel.
    pub fn build(self, panel: PanelConfig, mut rng: StdRng) -> Box<dyn Program> {
        let (width, height) = (panel.cols as usize, panel.rows as usize);
        match self {
            ProgramKind::Static => Box::new(plasma::StaticColor::new(plasma::DEFAULT_STATIC_COLOR)),
            ProgramKind::Spectral => Box::new(plasma::Spectral::new(0.05)),
            ProgramKind::RainbowWave => Box::new(plasma::RainbowWave::new(0.2, 1)),
            ProgramKind::RainbowPlasma => Box::new(plasma::RainbowPlasma::new(0.1, 8.0, &mut rng)),
            ProgramKind::FirePlasma => Box::new(plasma::FirePlasma::new(0.2, 6.0, &mut rng)),
            ProgramKind::Fire => Box::new(fire::FireDiffusion::new(
                fire::FireConfig::default(),
                width,
                height,
                &mut rng,
            )),
            ProgramKind::FallingSand => Box::new(sand::FallingSand::new(
                sand::SandConfig::default(),
                width,
                height,
                rng,
            )),
            ProgramKind::LavaLamp => Box::new(lava::LavaLamp::new(
                lava::LavaLampConfig::default(),
                width,
                height,
                &mut rng,
            )),
            ProgramKind::Ripples => Box::new(ripples::RippleField::new(
                ripples::RippleConfig::default(),
                width,
                height,
                rng,
            )),
            ProgramKind::MatrixRain => Box::new(trails::MatrixRain::new(1.0, width, height, rng)),
            ProgramKind::Vortex => Box::new(trails::Vortex::new(1.0)),
            ProgramKind::Kaleidoscope => Box::new(polar::Kaleidoscope::new(1.0)),
            ProgramKind::Octopus => Box::new(polar::Octopus::new(1.0, width, height)),
            ProgramKind::Bursts => Box::new(trails::Bursts::new(1.0, rng)),
            ProgramKind::Lissajous => Box::new(trails::Lissajous::new(1.0)),
            ProgramKind::DnaSpiral => Box::new(trails::DnaSpiral::new(1.0)),
            ProgramKind::Tetrahedron => Box::new(tetrahedron::Tetrahedron::new(1.0)),
            ProgramKind::StretchyTetrahedron => {
                Box::new(tetrahedron::StretchyTetrahedron::new(1.0))
            }
        }
    }
}

impl std::fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
