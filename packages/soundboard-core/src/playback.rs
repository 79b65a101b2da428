//! Playback controller for the single shared audio output.
//!
//! All mutations (play swap, stop, volume) and the output thread's renders
//! go through one mutex around the [`Mixer`]. File reads and decoding happen
//! before that lock is taken, so a slow decode never stalls other sessions.
//!
//! Only one sound plays at a time: a successful play first clears the mixer,
//! then adds the new voice. When two plays race, whichever reaches the swap
//! last is the one left playing.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::audio::mixer::{Mixer, Voice};
use crate::audio::output::{AudioOutput, OutputHandle, Renderer};
use crate::audio::{resample, SoundDecoder};
use crate::catalog::Asset;
use crate::error::{OutputError, PlaybackError};
use crate::state::OutputFormat;

/// Snapshot of the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub volume: f64,
    pub playing: bool,
}

/// Owns the output mixer and serializes control operations against it.
pub struct PlaybackController {
    mixer: Arc<Mutex<Mixer>>,
    /// Held across a volume change and its announcement. Kept apart from
    /// the mixer lock so announcing never stalls the output thread.
    volume_order: Mutex<()>,
    decoder: Arc<dyn SoundDecoder>,
    format: OutputFormat,
    output: OutputHandle,
}

impl PlaybackController {
    /// Opens the output and returns a controller driving it.
    ///
    /// Call once per process, before any play/stop/volume operation. The
    /// returned controller is shared by `Arc`.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] if the format is invalid or the device
    /// cannot be opened. Callers treat this as fatal.
    pub fn init(
        format: OutputFormat,
        output: &dyn AudioOutput,
        decoder: Arc<dyn SoundDecoder>,
    ) -> Result<Self, OutputError> {
        format.validate().map_err(OutputError::InvalidFormat)?;

        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let output = output.start(&format, Renderer::new(Arc::clone(&mixer)))?;

        log::info!(
            "[Playback] Output '{}' ready: {} Hz, {} channel(s), buffer {}",
            output.name(),
            format.sample_rate,
            format.channels,
            format.buffer_size
        );

        Ok(Self {
            mixer,
            volume_order: Mutex::new(()),
            decoder,
            format,
            output,
        })
    }

    /// Decodes `asset` and makes it the only sound playing.
    ///
    /// On error the mixer is untouched, so whatever was playing keeps
    /// playing.
    pub async fn play(&self, asset: &Asset) -> Result<(), PlaybackError> {
        if !self.decoder.supports(&asset.extension) {
            return Err(PlaybackError::UnsupportedFormat(asset.extension.clone()));
        }

        let bytes = tokio::fs::read(&asset.path)
            .await
            .map_err(|e| PlaybackError::Open {
                path: asset.path.clone(),
                reason: e.to_string(),
            })?;

        let decoder = Arc::clone(&self.decoder);
        let format = self.format;
        let extension = asset.extension.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            let sound = decoder.decode(bytes, &extension)?;
            resample::prepare(sound, &format)
        })
        .await
        .map_err(|e| PlaybackError::Decode {
            path: asset.path.clone(),
            reason: format!("decode task failed: {}", e),
        })?;

        let samples = decoded.map_err(|e| PlaybackError::Decode {
            path: asset.path.clone(),
            reason: e.to_string(),
        })?;

        let superseded = {
            let mut mixer = self.mixer.lock();
            let superseded = mixer.clear();
            mixer.add(Voice::new(asset.id, samples));
            superseded
        };

        log::info!(
            "[Playback] Playing #{} '{}' (superseded {} stream(s))",
            asset.id,
            asset.name,
            superseded
        );
        Ok(())
    }

    /// Clears every stream from the mixer. Safe to call when idle.
    pub fn stop(&self) -> usize {
        let stopped = self.mixer.lock().clear();
        if stopped > 0 {
            log::info!("[Playback] Stopped {} stream(s)", stopped);
        }
        stopped
    }

    /// Sets the output volume and returns the level actually applied.
    ///
    /// Out-of-range levels are clamped; non-finite levels leave the volume
    /// unchanged.
    pub fn set_volume(&self, level: f64) -> f64 {
        let applied = self.mixer.lock().set_volume(level);
        log::debug!("[Playback] Volume {} -> {}", level, applied);
        applied
    }

    /// Sets the volume, then calls `publish` with the applied level before
    /// any other `set_volume_and` can change it.
    ///
    /// Announcements made from `publish` therefore arrive in the order the
    /// levels were applied.
    pub fn set_volume_and<F>(&self, level: f64, publish: F) -> f64
    where
        F: FnOnce(f64),
    {
        let _order = self.volume_order.lock();
        let applied = self.set_volume(level);
        publish(applied);
        applied
    }

    pub fn current_state(&self) -> PlaybackState {
        let mixer = self.mixer.lock();
        PlaybackState {
            volume: mixer.volume(),
            playing: mixer.is_playing(),
        }
    }

    /// Catalog ids of the streams currently in the mixer.
    pub fn active_assets(&self) -> Vec<usize> {
        self.mixer.lock().asset_ids()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Name of the output backend in use.
    pub fn output_name(&self) -> &'static str {
        self.output.name()
    }
}
