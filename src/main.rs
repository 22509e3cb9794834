//! LED Matrix FX
//!
//! Runs procedural animations on an RGB LED matrix and exposes an HTTP API to pick
//! the program and brightness from any device on the LAN. Without a panel, the
//! `preview` subcommand renders any program to PNG files.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the LED matrix and the animator
//! - **HTTP server** (tokio/axum): accepts API requests, sends commands via channel
//!
//! ## Rust concepts
//! - clap derive with subcommands
//! - `#[tokio::main]` on the async half only
//! - `std::thread::spawn` for the render thread
//! - `Result` from `main` instead of panicking on startup errors
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-matrix-fx serve --port 8080
//! ./target/release/led-matrix-fx preview --program lava-lamp --frames 120 --out lava
//! ./target/release/led-matrix-fx list
//! ```

use clap::{Parser, Subcommand};
use led_matrix_fx::PanelConfig;
use led_matrix_fx::preview::{self, PreviewOptions};
use led_matrix_fx::program::ProgramKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "led-matrix-fx")]
#[command(about = "Procedural animations for RGB LED matrices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the panel and serve the HTTP API
    #[cfg(feature = "hardware")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Number of rows on the LED panel
        #[arg(long, default_value = "16")]
        rows: u32,

        /// Number of columns on the LED panel
        #[arg(long, default_value = "16")]
        cols: u32,

        /// Where the selected program and brightness are saved
        #[arg(long, default_value = "led-matrix-fx.json")]
        config: PathBuf,

        /// Target frames per second
        #[arg(long, default_value_t = led_matrix_fx::render::DEFAULT_FPS)]
        fps: u32,
    },

    /// Render a program to numbered PNG files
    Preview {
        #[arg(long, value_enum, default_value = "fire")]
        program: ProgramKind,

        #[arg(long, default_value = "60")]
        frames: u32,

        #[arg(long, default_value = "30")]
        fps: u32,

        /// Output pixels per LED
        #[arg(long, default_value = "16")]
        scale: u32,

        /// Output directory
        #[arg(long, default_value = "preview")]
        out: PathBuf,

        #[arg(long, default_value = "16")]
        rows: u32,

        #[arg(long, default_value = "16")]
        cols: u32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List available programs
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    match Cli::parse().command {
        #[cfg(feature = "hardware")]
        Command::Serve {
            port,
            rows,
            cols,
            config,
            fps,
        } => serve::run(port, PanelConfig::new(rows, cols), config, fps),
        Command::Preview {
            program,
            frames,
            fps,
            scale,
            out,
            rows,
            cols,
            seed,
        } => {
            let options = PreviewOptions {
                frames,
                fps,
                scale,
                seed,
                out_dir: out,
                ..PreviewOptions::default()
            };
            let written = preview::render_preview(program, PanelConfig::new(rows, cols), &options)?;
            println!("Wrote {} frames to {}", written.len(), options.out_dir.display());
            Ok(())
        }
        Command::List => {
            for kind in ProgramKind::ALL {
                let id = serde_json::to_value(kind)?;
                println!("{:<22} {}", id.as_str().unwrap_or_default(), kind.description());
            }
            Ok(())
        }
    }
}

#[cfg(feature = "hardware")]
mod serve {
    use led_matrix_fx::config::AppConfig;
    use led_matrix_fx::render::{DisplayStatus, RenderOptions, render_loop};
    use led_matrix_fx::server::{self, AppState};
    use led_matrix_fx::{PanelConfig, is_running, setup_signal_handler};
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::main(flavor = "current_thread")]
    pub async fn run(
        port: u16,
        panel: PanelConfig,
        config_path: PathBuf,
        fps: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!("LED Matrix FX v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!("Panel: {}x{}", panel.cols, panel.rows);
        tracing::info!("Config: {}", config_path.display());
        tracing::info!("Port: {}", port);

        let running = setup_signal_handler()?;

        // Create the channel for sending commands to the render thread.
        let (tx, rx) = mpsc::channel();

        // Shared display status: render thread writes, HTTP handlers read.
        let initial = AppConfig::load_or_default(&config_path);
        let status = Arc::new(Mutex::new(DisplayStatus::new(initial)));
        let latest_frame = Arc::new(Mutex::new(vec![0u8; panel.frame_byte_count()]));

        // Spawn the render thread.
        let render_status = status.clone();
        let render_frame = latest_frame.clone();
        let render_running = running.clone();
        let options = RenderOptions {
            panel,
            fps,
            config_path,
        };
        let render_handle = std::thread::spawn(move || {
            render_loop(rx, render_status, render_frame, render_running, options);
        });

        let app = server::create_router(AppState {
            command_tx: tx,
            status,
            latest_frame,
            panel,
        });

        let addr = format!("0.0.0.0:{}", port);
        tracing::info!("Listening on http://{}", addr);
        tracing::info!("API Documentation: http://localhost:{}/docs", port);
        tracing::info!("Try: curl http://localhost:{}/api/v1/programs", port);

        let listener = tokio::net::TcpListener::bind(&addr).await?;

        // Serve until Ctrl+C clears the running flag.
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while is_running(&running) {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                tracing::info!("Shutting down HTTP server");
            })
            .await?;

        if render_handle.join().is_err() {
            tracing::error!("Render thread panicked");
        }
        Ok(())
    }
}
