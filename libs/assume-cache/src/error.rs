//! Error types for cache operations.

use dra_id::{ObjectKey, ResourceVersion};
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors returned by [`AssumeCache`](crate::AssumeCache).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The key is not in the cache.
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: ObjectKey },

    /// The object to assume is not newer than the cached one.
    #[error("{kind} {key} is out of sync (stored: {stored}, assume: {assumed})")]
    StaleVersion {
        kind: &'static str,
        key: ObjectKey,
        stored: ResourceVersion,
        assumed: ResourceVersion,
    },
}

impl CacheError {
    /// Returns true if the key was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }

    /// Returns true if an assume was rejected as stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, CacheError::StaleVersion { .. })
    }
}
