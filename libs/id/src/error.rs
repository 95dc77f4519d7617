//! Error types for identity parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("identifier cannot be empty")]
    Empty,

    /// The UUID portion of a UID is invalid.
    #[error("invalid UID: {0}")]
    InvalidUid(String),

    /// The object key is malformed.
    #[error("invalid object key '{key}': {message}")]
    InvalidKey { key: String, message: &'static str },

    /// The resource version is not a non-negative integer.
    #[error("invalid resource version: '{0}'")]
    InvalidResourceVersion(String),
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }
}
