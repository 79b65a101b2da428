//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use soundboard_core::audio::{DecodeError, DecodedSound, OutputHandle, Renderer};
use soundboard_core::{
    bootstrap_services_with_decoder, AudioOutput, BootstrappedServices, Config, OutputError,
    OutputFormat, SoundDecoder,
};

/// Decodes any wav/mp3 file into one second of quiet stereo tone.
pub struct ToneDecoder;

impl SoundDecoder for ToneDecoder {
    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "wav" | "mp3")
    }

    fn decode(&self, _bytes: Vec<u8>, _extension: &str) -> Result<DecodedSound, DecodeError> {
        Ok(DecodedSound {
            samples: vec![0.1; 48000 * 2],
            sample_rate: 48000,
            channels: 2,
        })
    }
}

/// [`ToneDecoder`] that takes `delay` per decode.
pub struct SlowDecoder {
    pub delay: Duration,
}

impl SoundDecoder for SlowDecoder {
    fn supports(&self, extension: &str) -> bool {
        ToneDecoder.supports(extension)
    }

    fn decode(&self, bytes: Vec<u8>, extension: &str) -> Result<DecodedSound, DecodeError> {
        std::thread::sleep(self.delay);
        ToneDecoder.decode(bytes, extension)
    }
}

/// Output with no device thread; nothing drains the mixer.
pub struct DetachedOutput;

impl AudioOutput for DetachedOutput {
    fn name(&self) -> &'static str {
        "detached"
    }

    fn start(&self, _: &OutputFormat, _: Renderer) -> Result<OutputHandle, OutputError> {
        Ok(OutputHandle::detached("detached"))
    }
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub services: BootstrappedServices,
}

impl Fixture {
    /// Sound directory holding `kick.wav`, `snare.MP3` and `readme.txt`.
    pub fn new() -> Self {
        Self::with(Arc::new(ToneDecoder), 16)
    }

    /// Same files, with a custom decoder and per-client queue capacity.
    pub fn with(decoder: Arc<dyn SoundDecoder>, client_queue_capacity: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for file in ["kick.wav", "snare.MP3", "readme.txt"] {
            std::fs::write(dir.path().join(file), b"RIFF").unwrap();
        }
        let config = Config {
            sound_dir: dir.path().to_path_buf(),
            client_queue_capacity,
            ..Config::default()
        };
        let services = bootstrap_services_with_decoder(config, &DetachedOutput, decoder).unwrap();
        Self { dir, services }
    }

    /// Serves the router on an ephemeral local port.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = soundboard_core::api::http::create_router(self.services.app_state());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    /// Catalog id of the asset named `name`.
    pub fn id_of(&self, name: &str) -> i64 {
        self.services
            .catalog
            .snapshot()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.id as i64)
            .unwrap()
    }
}
