//! # dra-assume-cache
//!
//! An optimistic read-through cache for objects mirrored from the
//! authoritative store.
//!
//! For every key the cache holds the last version reported by the informer
//! (the *API object*) and, optionally, a newer version that the scheduler
//! assumes exists because it has just written it (the *assumed object*).
//! Reads see the assumed object until the informer catches up.
//!
//! ## Invariants
//!
//! - Informer updates never move the exposed version of a key backwards;
//!   only `restore` returns to an older, informer-reported version
//! - An assumed object is only accepted if strictly newer than what the key
//!   currently exposes
//! - An informer update at least as new as the assumed object replaces it
//! - An informer update older than the last informer version is dropped
//! - Every call is atomic on its own; sequences of calls are not

mod cache;
mod error;
mod event;
mod stats;

pub use cache::{AssumeCache, DEFAULT_EVENT_CAPACITY};
pub use error::{CacheError, CacheResult};
pub use event::CacheEvent;
pub use stats::CacheStats;
