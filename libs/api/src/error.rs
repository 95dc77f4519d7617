//! Error types for decoding API objects.

use thiserror::Error;

/// Errors that can occur when decoding objects and watch events.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// The watch event type is unknown.
    #[error("unknown watch event type: {0}")]
    UnknownEventType(String),

    /// The object kind does not match what the stream carries.
    #[error("unexpected object kind: expected {expected}, got {actual}")]
    UnexpectedKind {
        expected: &'static str,
        actual: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
