//! Audio decode, resampling, mixing and device output.
//!
//! The playback controller only talks to this module through two seams:
//!
//! - [`SoundDecoder`]: turns the bytes of a sound file into interleaved PCM
//! - [`AudioOutput`](output::AudioOutput): pulls rendered frames from the
//!   shared [`Mixer`](mixer::Mixer) and hands them to a device
//!
//! Both have a bundled implementation ([`SymphoniaDecoder`](decoder::SymphoniaDecoder),
//! [`NullOutput`](output::NullOutput) and, with the `cpal` feature,
//! `CpalOutput`) and can be replaced in tests.

use thiserror::Error;

#[cfg(feature = "cpal")]
pub mod cpal_output;
pub mod decoder;
pub mod mixer;
pub mod output;
pub mod resample;
#[cfg(test)]
pub(crate) mod test_fixtures;

#[cfg(feature = "cpal")]
pub use cpal_output::CpalOutput;
pub use decoder::SymphoniaDecoder;
pub use mixer::{Mixer, Voice};
pub use output::{AudioOutput, NullOutput, OutputHandle, Renderer};

/// Decoded PCM audio, interleaved `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSound {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedSound {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Reasons a decoder can reject a sound.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no playable audio track")]
    NoTrack,

    #[error("stream contained no audio frames")]
    Empty,

    #[error(transparent)]
    Symphonia(#[from] symphonia::core::errors::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Decodes sound file bytes into PCM.
///
/// Implementations run on a blocking thread, never under the mixer lock.
pub trait SoundDecoder: Send + Sync {
    /// Returns whether files with this (lower-cased) extension can be decoded.
    fn supports(&self, extension: &str) -> bool;

    /// Decodes a whole file.
    fn decode(&self, bytes: Vec<u8>, extension: &str) -> Result<DecodedSound, DecodeError>;
}
