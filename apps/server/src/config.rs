//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use soundboard_core::protocol_constants::{
    DEFAULT_BIND_PORT, DEFAULT_BUFFER_SIZE, DEFAULT_CHANNELS, DEFAULT_CLIENT_QUEUE_CAPACITY,
    DEFAULT_SAMPLE_RATE,
};
use soundboard_core::OutputFormat;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory scanned for sound files.
    /// Override: `SOUNDBOARD_SOUND_DIR`
    pub sound_dir: PathBuf,

    /// Output sample rate in Hz.
    /// Override: `SOUNDBOARD_SAMPLE_RATE`
    pub sample_rate: u32,

    /// Output buffer size in frames.
    /// Override: `SOUNDBOARD_BUFFER_SIZE`
    pub buffer_size: usize,

    /// Output channel count.
    /// Override: `SOUNDBOARD_CHANNELS`
    pub channels: u16,

    /// Port to bind the HTTP server to.
    /// Override: `SOUNDBOARD_BIND_PORT`
    pub bind_port: u16,

    /// Directory with the browser front-end.
    /// Override: `SOUNDBOARD_WEB_ROOT`
    pub web_root: Option<PathBuf>,

    /// Outbound message queue capacity per client.
    /// Override: `SOUNDBOARD_CLIENT_QUEUE_CAPACITY`
    pub client_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sound_dir: PathBuf::from("./sounds"),
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            channels: DEFAULT_CHANNELS,
            bind_port: DEFAULT_BIND_PORT,
            web_root: None,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `SOUNDBOARD_*` overrides looked up through `var`.
    ///
    /// Values that do not parse are ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SOUNDBOARD_SOUND_DIR") {
            self.sound_dir = PathBuf::from(val);
        }

        if let Some(rate) = var("SOUNDBOARD_SAMPLE_RATE").and_then(|v| v.parse().ok()) {
            self.sample_rate = rate;
        }

        if let Some(size) = var("SOUNDBOARD_BUFFER_SIZE").and_then(|v| v.parse().ok()) {
            self.buffer_size = size;
        }

        if let Some(channels) = var("SOUNDBOARD_CHANNELS").and_then(|v| v.parse().ok()) {
            self.channels = channels;
        }

        if let Some(port) = var("SOUNDBOARD_BIND_PORT").and_then(|v| v.parse().ok()) {
            self.bind_port = port;
        }

        if let Some(val) = var("SOUNDBOARD_WEB_ROOT") {
            self.web_root = Some(PathBuf::from(val));
        }

        if let Some(capacity) =
            var("SOUNDBOARD_CLIENT_QUEUE_CAPACITY").and_then(|v| v.parse().ok())
        {
            self.client_queue_capacity = capacity;
        }
    }

    /// Converts to soundboard-core's Config type.
    pub fn to_core_config(&self) -> soundboard_core::Config {
        soundboard_core::Config {
            sound_dir: self.sound_dir.clone(),
            output: OutputFormat {
                sample_rate: self.sample_rate,
                channels: self.channels,
                buffer_size: self.buffer_size,
            },
            bind_port: self.bind_port,
            web_root: self.web_root.clone(),
            client_queue_capacity: self.client_queue_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overridden(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = ServerConfig::default();
        config.apply_overrides(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn every_setting_has_an_env_override() {
        let config = overridden(&[
            ("SOUNDBOARD_SOUND_DIR", "/srv/sounds"),
            ("SOUNDBOARD_SAMPLE_RATE", "44100"),
            ("SOUNDBOARD_BUFFER_SIZE", "1024"),
            ("SOUNDBOARD_CHANNELS", "1"),
            ("SOUNDBOARD_BIND_PORT", "9090"),
            ("SOUNDBOARD_WEB_ROOT", "/srv/web"),
            ("SOUNDBOARD_CLIENT_QUEUE_CAPACITY", "8"),
        ]);
        assert_eq!(config.sound_dir, PathBuf::from("/srv/sounds"));
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.channels, 1);
        assert_eq!(config.bind_port, 9090);
        assert_eq!(config.web_root, Some(PathBuf::from("/srv/web")));
        assert_eq!(config.client_queue_capacity, 8);
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let config = overridden(&[
            ("SOUNDBOARD_CHANNELS", "stereo"),
            ("SOUNDBOARD_CLIENT_QUEUE_CAPACITY", "-1"),
        ]);
        assert_eq!(config.channels, DEFAULT_CHANNELS);
        assert_eq!(config.client_queue_capacity, DEFAULT_CLIENT_QUEUE_CAPACITY);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soundboard.yaml");
        std::fs::write(&path, "sound_dir: /srv/sounds\nbuffer_size: 512\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.sound_dir, PathBuf::from("/srv/sounds"));
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.bind_port, DEFAULT_BIND_PORT);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServerConfig::from_file(&dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "sample_rate: [not, a, number]\n").unwrap();
        assert!(ServerConfig::from_file(&path).is_err());
    }

    #[test]
    fn core_config_carries_output_format() {
        let config = ServerConfig {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 1,
            ..ServerConfig::default()
        };
        let core = config.to_core_config();
        assert_eq!(core.output.sample_rate, 44100);
        assert_eq!(core.output.buffer_size, 1024);
        assert_eq!(core.output.channels, 1);
        assert!(core.validate().is_ok());
    }
}
