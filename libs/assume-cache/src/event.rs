//! Notifications about changes of the exposed object version.

use std::sync::Arc;

/// A change of the version a key exposes to readers.
///
/// Emitted for informer changes as well as for local assume/restore, so
/// subscribers can requeue work that was waiting on a claim. Informer updates
/// hidden behind a newer assumed object produce no event.
#[derive(Debug)]
pub enum CacheEvent<T> {
    Added(Arc<T>),
    Updated { old: Arc<T>, new: Arc<T> },
    Deleted(Arc<T>),
}

// Manual impl: cloning only bumps reference counts, so `T: Clone` is not needed.
impl<T> Clone for CacheEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Added(obj) => Self::Added(Arc::clone(obj)),
            Self::Updated { old, new } => Self::Updated {
                old: Arc::clone(old),
                new: Arc::clone(new),
            },
            Self::Deleted(obj) => Self::Deleted(Arc::clone(obj)),
        }
    }
}

impl<T> CacheEvent<T> {
    /// The object readers see after the change (the last one for deletes).
    pub fn object(&self) -> &Arc<T> {
        match self {
            Self::Added(obj) | Self::Deleted(obj) => obj,
            Self::Updated { new, .. } => new,
        }
    }
}
