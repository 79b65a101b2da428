//! Core application configuration.
//!
//! [`Config`] carries everything the core needs to start: where the sounds
//! live, how the output device is opened and how the server listens. The
//! server binary builds one from YAML, environment and CLI flags.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    DEFAULT_BIND_PORT, DEFAULT_BUFFER_SIZE, DEFAULT_CHANNELS, DEFAULT_CLIENT_QUEUE_CAPACITY,
    DEFAULT_SAMPLE_RATE,
};

/// Output device parameters consumed by the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames rendered per device period.
    pub buffer_size: usize,
}

impl OutputFormat {
    /// Validates the format values.
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample_rate must be >= 1".to_string());
        }
        if self.channels == 0 {
            return Err("channels must be >= 1".to_string());
        }
        if self.buffer_size == 0 {
            return Err("buffer_size must be >= 1".to_string());
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Configuration for the soundboard application.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Root directory scanned for sound files.
    pub sound_dir: PathBuf,

    /// Audio output parameters.
    pub output: OutputFormat,

    /// Port for the HTTP/WS server.
    pub bind_port: u16,

    /// Directory with the browser front-end, served at `/` when set.
    pub web_root: Option<PathBuf>,

    /// Capacity of each client's outbound message queue.
    pub client_queue_capacity: usize,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.output.validate()?;
        if self.client_queue_capacity == 0 {
            return Err("client_queue_capacity must be >= 1".to_string());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sound_dir: PathBuf::from("./sounds"),
            output: OutputFormat::default(),
            bind_port: DEFAULT_BIND_PORT,
            web_root: None,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
        }
    }
}
