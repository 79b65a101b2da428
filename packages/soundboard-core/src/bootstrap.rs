//! Application bootstrap and dependency wiring.
//!
//! This is the composition root: the catalog, playback controller and client
//! hub are created here and handed out as explicitly owned `Arc`s. Nothing
//! else in the crate constructs them.

use std::sync::Arc;

use crate::api::AppState;
use crate::audio::{AudioOutput, SoundDecoder, SymphoniaDecoder};
use crate::catalog::Catalog;
use crate::error::{SoundboardError, SoundboardResult};
use crate::hub::ClientHub;
use crate::playback::PlaybackController;
use crate::state::Config;

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Sound catalog.
    pub catalog: Arc<Catalog>,
    /// Controller for the single audio output.
    pub playback: Arc<PlaybackController>,
    /// Connected control clients.
    pub hub: Arc<ClientHub>,
    /// Validated configuration.
    pub config: Arc<Config>,
}

impl BootstrappedServices {
    /// Builds the API state from these services.
    pub fn app_state(&self) -> AppState {
        AppState::builder()
            .catalog(Arc::clone(&self.catalog))
            .playback(Arc::clone(&self.playback))
            .hub(Arc::clone(&self.hub))
            .config(Arc::clone(&self.config))
            .build()
    }

    /// Closes every control session and silences the output.
    pub fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");

        let closed = self.hub.close_all();
        if closed > 0 {
            log::info!("[Bootstrap] Closed {} control session(s)", closed);
        }

        let stopped = self.playback.stop();
        log::info!("[Bootstrap] Stopped {} stream(s)", stopped);

        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Bootstraps all services with the bundled decoder.
///
/// # Errors
///
/// Fails if the configuration is invalid, the sound directory cannot be
/// read, or the audio output cannot be opened.
pub fn bootstrap_services(
    config: Config,
    output: &dyn AudioOutput,
) -> SoundboardResult<BootstrappedServices> {
    bootstrap_services_with_decoder(config, output, Arc::new(SymphoniaDecoder::new()))
}

/// Bootstraps all services with a caller-supplied decoder.
pub fn bootstrap_services_with_decoder(
    config: Config,
    output: &dyn AudioOutput,
    decoder: Arc<dyn SoundDecoder>,
) -> SoundboardResult<BootstrappedServices> {
    config.validate().map_err(SoundboardError::Configuration)?;

    let catalog = Catalog::scan(&config.sound_dir)?;
    log::info!(
        "[Bootstrap] Catalog: {} sound(s) in {}",
        catalog.len(),
        config.sound_dir.display()
    );

    let playback = PlaybackController::init(config.output, output, decoder)?;
    let hub = ClientHub::new(config.client_queue_capacity);

    Ok(BootstrappedServices {
        catalog: Arc::new(catalog),
        playback: Arc::new(playback),
        hub: Arc::new(hub),
        config: Arc::new(config),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{OutputHandle, Renderer};
    use crate::error::OutputError;
    use crate::state::OutputFormat;

    struct DetachedOutput;

    impl AudioOutput for DetachedOutput {
        fn name(&self) -> &'static str {
            "detached"
        }

        fn start(&self, _: &OutputFormat, _: Renderer) -> Result<OutputHandle, OutputError> {
            Ok(OutputHandle::detached("detached"))
        }
    }

    struct BrokenOutput;

    impl AudioOutput for BrokenOutput {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn start(&self, _: &OutputFormat, _: Renderer) -> Result<OutputHandle, OutputError> {
            Err(OutputError::Init("no device".into()))
        }
    }

    fn config_for(dir: &std::path::Path) -> Config {
        Config {
            sound_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn wires_all_services() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kick.wav"), b"RIFF").unwrap();

        let services = bootstrap_services(config_for(dir.path()), &DetachedOutput).unwrap();
        assert_eq!(services.catalog.len(), 1);
        assert_eq!(services.playback.output_name(), "detached");
        assert_eq!(services.hub.client_count(), 0);

        let state = services.app_state();
        assert!(Arc::ptr_eq(&state.hub, &services.hub));
    }

    #[test]
    fn missing_sound_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = bootstrap_services(config_for(&dir.path().join("nope")), &DetachedOutput);
        assert!(matches!(result, Err(SoundboardError::Catalog(_))));
    }

    #[test]
    fn output_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = bootstrap_services(config_for(dir.path()), &BrokenOutput);
        assert!(matches!(result, Err(SoundboardError::Output(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.client_queue_capacity = 0;
        let result = bootstrap_services(config, &DetachedOutput);
        assert!(matches!(result, Err(SoundboardError::Configuration(_))));
    }

    #[test]
    fn shutdown_closes_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let services = bootstrap_services(config_for(dir.path()), &DetachedOutput).unwrap();
        let (guard, _rx) = services.hub.register(Vec::new);

        services.shutdown();
        assert!(guard.cancel_token().is_cancelled());
        assert!(!services.playback.current_state().playing);
    }
}
