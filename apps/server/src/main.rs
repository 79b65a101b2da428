//! Soundboard Server - headless networked soundboard.
//!
//! Scans a sound directory, opens the audio output and serves the control
//! WebSocket plus a small read-only HTTP API. The browser front-end can be
//! served from a web root directory.

mod config;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use soundboard_core::{
    bootstrap_services, start_server, AudioOutput, BootstrappedServices, NullOutput,
};
use tokio::signal;

use crate::config::ServerConfig;

/// Audio output backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// Render in real time and discard (no sound device needed).
    Null,
    /// Default system output device.
    #[cfg(feature = "cpal")]
    Cpal,
}

#[cfg(feature = "cpal")]
const DEFAULT_OUTPUT: OutputKind = OutputKind::Cpal;
#[cfg(not(feature = "cpal"))]
const DEFAULT_OUTPUT: OutputKind = OutputKind::Null;

impl OutputKind {
    fn create(self) -> Box<dyn AudioOutput> {
        match self {
            OutputKind::Null => Box::new(NullOutput),
            #[cfg(feature = "cpal")]
            OutputKind::Cpal => Box::new(soundboard_core::CpalOutput),
        }
    }
}

/// Soundboard Server - play sounds on this machine from any browser.
#[derive(Parser, Debug)]
#[command(name = "soundboard-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "SOUNDBOARD_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Sound directory (overrides config file).
    #[arg(long, value_name = "DIR", env = "SOUNDBOARD_SOUND_DIR")]
    path: Option<PathBuf>,

    /// Output sample rate in Hz (overrides config file).
    #[arg(long, env = "SOUNDBOARD_SAMPLE_RATE")]
    samplerate: Option<u32>,

    /// Output buffer size in frames (overrides config file).
    #[arg(long, env = "SOUNDBOARD_BUFFER_SIZE")]
    buff: Option<usize>,

    /// Output channel count (overrides config file).
    #[arg(long, env = "SOUNDBOARD_CHANNELS")]
    channels: Option<u16>,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "SOUNDBOARD_BIND_PORT")]
    port: Option<u16>,

    /// Front-end directory served at `/` (overrides config file).
    #[arg(long, value_name = "DIR", env = "SOUNDBOARD_WEB_ROOT")]
    web_root: Option<PathBuf>,

    /// Audio output backend.
    #[arg(long, value_enum, env = "SOUNDBOARD_OUTPUT")]
    output: Option<OutputKind>,
}

impl Args {
    fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(path) = &self.path {
            config.sound_dir = path.clone();
        }
        if let Some(rate) = self.samplerate {
            config.sample_rate = rate;
        }
        if let Some(buff) = self.buff {
            config.buffer_size = buff;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(port) = self.port {
            config.bind_port = port;
        }
        if let Some(web_root) = &self.web_root {
            config.web_root = Some(web_root.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Soundboard Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration, then apply CLI overrides
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_to(&mut config);

    log::info!(
        "Configuration: sound_dir={}, sample_rate={}, buffer_size={}, bind_port={}",
        config.sound_dir.display(),
        config.sample_rate,
        config.buffer_size,
        config.bind_port
    );

    let output = args.output.unwrap_or(DEFAULT_OUTPUT).create();
    log::info!("Audio output: {}", output.name());

    // The output device is opened here; failure is fatal.
    let services = bootstrap_services(config.to_core_config(), output.as_ref())
        .context("Failed to bootstrap services")?;

    log::info!("Services bootstrapped successfully");

    let result = serve(&services, shutdown_signal()).await;

    log::info!("Server stopped, cleaning up...");
    services.shutdown();
    result?;

    log::info!("Shutdown complete");
    Ok(())
}

/// Runs the HTTP server until `shutdown` resolves.
///
/// Bind and serve failures are returned so the process exits non-zero.
async fn serve<F>(services: &BootstrappedServices, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = services.app_state();
    let port = state.config.bind_port;
    tokio::spawn(start_server(state, shutdown))
        .await
        .context("Server task panicked")?
        .with_context(|| format!("HTTP server on port {} failed", port))
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
