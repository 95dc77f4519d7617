//! # dra-api
//!
//! Object model for dynamic resource allocation, as mirrored from the
//! authoritative store.
//!
//! ## Design Principles
//!
//! - Objects are immutable snapshots; every change is a whole-object
//!   replacement carrying a newer resource version
//! - Every object exposes a stable cache key and resource version through
//!   the [`Object`] trait
//! - Wire names follow the upstream API (camelCase fields)
//!
//! ## Object Kinds
//!
//! - [`ResourceClaim`]: namespaced request for devices, optionally allocated
//! - [`DeviceClass`]: cluster-scoped description of a kind of device
//! - [`ResourceSlice`]: cluster-scoped inventory published by a driver
//!
//! Changes arrive as [`WatchEvent`]s.

mod catalog;
mod claim;
mod error;
mod meta;
mod watch;

pub use catalog::*;
pub use claim::*;
pub use error::ApiError;
pub use meta::{Object, ObjectMeta};
pub use watch::WatchEvent;
