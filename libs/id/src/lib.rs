//! # dra-id
//!
//! Identity types for objects mirrored from the authoritative store.
//!
//! ## Design Principles
//!
//! - UIDs are stable for the lifetime of an object; names are user labels
//! - UIDs are typed to prevent mixing identities of different object kinds
//! - Cache keys have exactly one canonical string form
//! - Resource versions are totally ordered and only ever increase
//!
//! ## Key Format
//!
//! Namespaced objects are keyed as `{namespace}/{name}`, cluster-scoped
//! objects by `{name}` alone:
//!
//! - `default/gpu-claim`
//! - `team-a/inference-0-gpu`
//! - `gpu.example.com`

mod error;
mod key;
mod macros;
mod types;

pub use error::IdError;
pub use key::ObjectKey;
pub use types::*;

/// Re-export uuid for consumers that need raw UUID operations
pub use uuid::Uuid;
