//! Centralized error types for the soundboard core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types per concern using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Request failures use the code as the `reason` of the `error` control
/// message; [`SoundboardError`] uses it as the `error` field of HTTP bodies.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

/// Errors raised while scanning the sound directory.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog root itself could not be opened.
    #[error("Cannot open sound directory {}: {source}", path.display())]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for CatalogError {
    fn code(&self) -> &'static str {
        match self {
            Self::ScanFailed { .. } => "scanFailed",
        }
    }
}

/// Per-request playback failures.
///
/// These are reported to the requesting client only and never change the
/// controller state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The requested sound id is not in the current catalog snapshot.
    #[error("Unknown sound id: {0}")]
    UnknownAsset(i64),

    /// The asset file could not be opened or read.
    #[error("Could not open {path}: {reason}")]
    Open { path: String, reason: String },

    /// The asset bytes could not be decoded.
    #[error("Could not decode {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The asset extension is not handled by the decoder.
    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),
}

impl ErrorCode for PlaybackError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownAsset(_) => "unknownAsset",
            Self::Open { .. } => "open",
            Self::Decode { .. } => "decode",
            Self::UnsupportedFormat(_) => "unsupportedFormat",
        }
    }
}

/// Errors raised while opening the audio output.
///
/// Any of these at startup means the process cannot proceed.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The requested output format is unusable.
    #[error("Invalid output format: {0}")]
    InvalidFormat(String),

    /// The output device could not be opened or started.
    #[error("Could not initialize audio output: {0}")]
    Init(String),
}

/// Application-wide error type for the soundboard server.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum SoundboardError {
    /// Sound directory scan failed.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Requested asset does not exist.
    #[error("Sound not found: {0}")]
    AssetNotFound(i64),

    /// Audio output could not be opened.
    #[error("Output error: {0}")]
    Output(String),

    /// Server configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ErrorCode for SoundboardError {
    fn code(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog_error",
            Self::AssetNotFound(_) => "sound_not_found",
            Self::Output(_) => "output_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

impl SoundboardError {
    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AssetNotFound(_) => StatusCode::NOT_FOUND,
            Self::Configuration(_) | Self::Output(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type SoundboardResult<T> = Result<T, SoundboardError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for SoundboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for SoundboardError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err.to_string())
    }
}

impl From<OutputError> for SoundboardError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}
