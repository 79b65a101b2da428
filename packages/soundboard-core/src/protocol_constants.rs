//! Fixed protocol and audio constants.
//!
//! Values here are shared by the wire protocol, the mixer and the config
//! defaults. Tunable values live in [`crate::state::Config`].

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Service identifier reported by the health endpoint.
pub const SERVICE_ID: &str = "soundboard";

// ─────────────────────────────────────────────────────────────────────────────
// Audio Output
// ─────────────────────────────────────────────────────────────────────────────

/// Default output sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Default output buffer size (frames per device period).
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Default number of output channels (stereo).
pub const DEFAULT_CHANNELS: u16 = 2;

/// Base of the exponential gain curve: `gain = VOLUME_BASE ^ volume`.
///
/// With base 2, each unit of volume is roughly 6 dB.
pub const VOLUME_BASE: f64 = 2.0;

/// Lowest accepted volume. At this level the output is silent.
pub const VOLUME_MIN: f64 = -10.0;

/// Highest accepted volume (4x gain).
pub const VOLUME_MAX: f64 = 2.0;

/// Volume the controller starts with (unity gain).
pub const VOLUME_DEFAULT: f64 = 0.0;

/// Sinc filter length used when resampling decoded sounds.
pub const RESAMPLE_SINC_LEN: usize = 128;

/// Extensions the bundled decoder understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3"];

// ─────────────────────────────────────────────────────────────────────────────
// Client Sync
// ─────────────────────────────────────────────────────────────────────────────

/// Default capacity of each client's outbound queue.
///
/// A client that falls this far behind is dropped by the hub.
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 64;

/// Default HTTP/WS listen port.
pub const DEFAULT_BIND_PORT: u16 = 8080;
