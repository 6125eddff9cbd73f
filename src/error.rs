//! Error types for the renderer

use thiserror::Error;

use crate::rendering::layout::ValueKind;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving or rendering layout documents
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying stream or file I/O failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The stream closed part-way through a length prefix
    #[error("Stream closed inside a length prefix ({received} of 4 bytes)")]
    TruncatedPrefix { received: usize },

    /// The stream closed before the announced payload arrived
    #[error("Stream closed mid-frame: expected {expected} bytes, got {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// A frame announced a payload larger than the configured maximum
    #[error("Frame of {len} bytes exceeds the maximum of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// The request payload is not a valid layout document
    #[error("Failed to decode layout document: {0}")]
    DecodeError(String),

    /// A widget references a key that is absent from `values`
    #[error("Unresolved value reference '{key}' (expected {expected})")]
    UnresolvedValue { key: String, expected: ValueKind },

    /// A widget references a value of the wrong type
    #[error("Value '{key}' has type {found}, expected {expected}")]
    ValueTypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The font could not be read or parsed
    #[error("Font loading failed: {0}")]
    FontError(String),

    /// The canvas could not be encoded to an image
    #[error("Image encoding failed: {0}")]
    EncodeError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether this failure is scoped to a single request.
    ///
    /// Request failures leave the stream aligned on a frame boundary, so a
    /// session may answer them with an empty frame and carry on. Everything
    /// else (framing, I/O, fonts, encoding) is fatal to the session.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            Error::DecodeError(_) | Error::UnresolvedValue { .. } | Error::ValueTypeMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodeError(err.to_string())
    }
}
