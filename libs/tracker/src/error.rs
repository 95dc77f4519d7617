//! Error types for claim tracking and catalog lookups.

use dra_assume_cache::CacheError;
use dra_id::{ObjectKey, ResourceVersion};
use thiserror::Error;

/// Result type for claim tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors returned by the claim tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The claim is not in the cache.
    #[error("resource claim {key} not found")]
    NotFound { key: ObjectKey },

    /// An assumed claim was not newer than the cached one. This means
    /// assumes were issued out of order and must not be ignored.
    #[error("resource claim {key} is out of sync (stored: {stored}, assume: {assumed})")]
    StaleWrite {
        key: ObjectKey,
        stored: ResourceVersion,
        assumed: ResourceVersion,
    },
}

impl TrackerError {
    /// Returns true if the claim was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound { .. })
    }
}

impl From<CacheError> for TrackerError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound { key, .. } => TrackerError::NotFound { key },
            CacheError::StaleVersion {
                key,
                stored,
                assumed,
                ..
            } => TrackerError::StaleWrite {
                key,
                stored,
                assumed,
            },
        }
    }
}

/// Errors returned by catalog listers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListerError {
    /// No object of this kind has the given name.
    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },
}
