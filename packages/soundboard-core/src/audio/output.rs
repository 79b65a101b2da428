//! Audio output abstraction.
//!
//! An [`AudioOutput`] owns the device on a dedicated thread and pulls
//! rendered frames from the shared mixer through a [`Renderer`]. Device
//! handles are frequently `!Send`, so they never leave that thread; the rest
//! of the program only keeps an [`OutputHandle`] that stops the thread on
//! drop.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use super::mixer::Mixer;
use crate::error::OutputError;
use crate::state::OutputFormat;

/// Pulls mixed audio for the output device.
///
/// Every render takes the controller lock, so it is serialized with play,
/// stop and volume changes.
#[derive(Clone)]
pub struct Renderer {
    mixer: Arc<Mutex<Mixer>>,
}

impl Renderer {
    pub(crate) fn new(mixer: Arc<Mutex<Mixer>>) -> Self {
        Self { mixer }
    }

    /// Fills `out` with the next interleaved frames.
    pub fn render(&self, out: &mut [f32]) {
        self.mixer.lock().render(out);
    }
}

/// A device (or stand-in) that plays what the mixer renders.
pub trait AudioOutput: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Opens the device and starts pulling from `renderer`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Init`] if the device cannot be opened.
    fn start(&self, format: &OutputFormat, renderer: Renderer) -> Result<OutputHandle, OutputError>;
}

/// Keeps an output running; stops and joins its thread when dropped.
pub struct OutputHandle {
    name: &'static str,
    shutdown: Option<SyncSender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl OutputHandle {
    /// Runs `body` on a dedicated thread and waits for it to report readiness.
    ///
    /// `body` must send exactly one readiness result, then keep the device
    /// alive until the shutdown receiver fires or disconnects.
    pub fn spawn<F>(name: &'static str, body: F) -> Result<Self, OutputError>
    where
        F: FnOnce(SyncSender<Result<(), OutputError>>, Receiver<()>) + Send + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::sync_channel(1);

        let thread = std::thread::Builder::new()
            .name(format!("audio-{}", name))
            .spawn(move || body(ready_tx, shutdown_rx))
            .map_err(|e| OutputError::Init(format!("failed to spawn output thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("[Output] {} output started", name);
                Ok(Self {
                    name,
                    shutdown: Some(shutdown_tx),
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(OutputError::Init(format!(
                    "{} output thread exited during startup",
                    name
                )))
            }
        }
    }

    /// A handle with no thread behind it, for outputs driven externally.
    pub fn detached(name: &'static str) -> Self {
        Self {
            name,
            shutdown: None,
            thread: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            log::info!("[Output] {} output stopped", self.name);
        }
    }
}

/// Output that renders in real time and discards the audio.
///
/// Used on hosts without a sound device. Sounds still progress and finish,
/// so the reported playback state matches what a device would produce.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn name(&self) -> &'static str {
        "null"
    }

    fn start(&self, format: &OutputFormat, renderer: Renderer) -> Result<OutputHandle, OutputError> {
        format.validate().map_err(OutputError::InvalidFormat)?;

        let mut buffer = vec![0.0f32; format.buffer_size * format.channels as usize];
        let period =
            Duration::from_secs_f64(format.buffer_size as f64 / format.sample_rate as f64);

        OutputHandle::spawn(self.name(), move |ready, shutdown| {
            let _ = ready.send(Ok(()));
            loop {
                match shutdown.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => renderer.render(&mut buffer),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
    }
}
