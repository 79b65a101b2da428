//! Soundboard Core - playback control for a networked soundboard.
//!
//! Remote clients browse a catalog of sound files and trigger play, stop and
//! volume changes on one shared audio output. Every connected client sees the
//! same catalog and volume.
//!
//! # Architecture
//!
//! - [`catalog`]: directory scan into an atomically swappable asset list
//! - [`playback`]: the controller serializing play/stop/volume against the mixer
//! - [`hub`]: registry of connected clients and message fan-out
//! - [`session`]: per-client dispatch of control messages
//! - [`protocol`]: JSON control message wire format
//! - [`audio`]: decode, resample, mix and device output
//! - [`api`]: axum router, WebSocket endpoint and server startup
//! - [`bootstrap`]: composition root
//!
//! # Abstraction Traits
//!
//! - [`SoundDecoder`](audio::SoundDecoder): file bytes to PCM
//! - [`AudioOutput`](audio::AudioOutput): owns the device and pulls from the mixer
//!
//! The bundled implementations are [`SymphoniaDecoder`](audio::SymphoniaDecoder),
//! [`NullOutput`](audio::NullOutput) and, with the `cpal` feature, `CpalOutput`.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod audio;
pub mod bootstrap;
pub mod catalog;
pub mod error;
pub mod hub;
pub mod playback;
pub mod protocol;
pub mod protocol_constants;
pub mod session;
pub mod state;

// Re-export commonly used types at the crate root
pub use catalog::{Asset, Catalog};
pub use error::{
    CatalogError, ErrorCode, OutputError, PlaybackError, SoundboardError, SoundboardResult,
};
pub use hub::{ClientGuard, ClientHub, ClientId};
pub use playback::{PlaybackController, PlaybackState};
pub use protocol::ControlMessage;
pub use session::ControlSession;
pub use state::{Config, OutputFormat};

// Re-export audio types
#[cfg(feature = "cpal")]
pub use audio::CpalOutput;
pub use audio::{AudioOutput, NullOutput, SoundDecoder, SymphoniaDecoder};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, bootstrap_services_with_decoder, BootstrappedServices};

// Re-export API types
pub use api::{start_server, AppState, AppStateBuilder, ServerError};
