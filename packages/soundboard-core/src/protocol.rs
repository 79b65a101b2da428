//! Control message wire format.
//!
//! One JSON object per WebSocket text frame, tagged by `type`:
//!
//! ```json
//! {"type": "play", "soundID": 3}
//! {"type": "volume", "volume": -2.0}
//! {"type": "load", "soundFiles": [{"id": 0, "name": "kick", "extension": "wav", "path": "..."}]}
//! ```
//!
//! Every variant carries an optional human-readable `msg`. Unknown fields
//! are ignored.

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Asset;
use crate::error::ErrorCode;

/// A message exchanged over a control session, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Play the asset with this catalog id.
    Play {
        #[serde(rename = "soundID")]
        sound_id: i64,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        msg: String,
    },

    /// Stop all playback.
    Stop {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        msg: String,
    },

    /// Inbound: set the volume. Outbound: the volume now in effect.
    Volume {
        volume: f64,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        msg: String,
    },

    /// Inbound: reload the catalog. Outbound: the current asset list.
    Load {
        #[serde(
            rename = "soundFiles",
            alias = "soundfiles",
            default,
            deserialize_with = "null_as_default"
        )]
        sound_files: Vec<Asset>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        msg: String,
    },

    /// Sent back unchanged to the sender.
    Echo {
        #[serde(default)]
        msg: String,
    },

    /// Inbound: a client-side problem report. Outbound: a failed request,
    /// with a machine-readable `reason` such as `open` or `decode`.
    Error {
        #[serde(default)]
        msg: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ControlMessage {
    pub fn load(sound_files: Vec<Asset>) -> Self {
        Self::Load {
            sound_files,
            msg: String::new(),
        }
    }

    pub fn volume(volume: f64) -> Self {
        Self::Volume {
            volume,
            msg: String::new(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            msg: msg.into(),
            reason: None,
        }
    }

    /// Error reply for a failed request.
    pub fn failure(err: &(impl ErrorCode + std::fmt::Display)) -> Self {
        Self::Error {
            msg: err.to_string(),
            reason: Some(err.code().to_string()),
        }
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Stop { .. } => "stop",
            Self::Volume { .. } => "volume",
            Self::Load { .. } => "load",
            Self::Echo { .. } => "echo",
            Self::Error { .. } => "error",
        }
    }

    /// Parses one text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
