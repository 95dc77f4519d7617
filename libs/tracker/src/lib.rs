//! # dra-tracker
//!
//! Tracks, for one scheduler process, what is known about the allocation
//! state of every resource claim.
//!
//! Two sources are merged:
//!
//! - the **assume cache**: informer state plus claims the scheduler has
//!   already written to the store but not yet seen come back;
//! - the **in-flight ledger**: allocation decisions made by a scheduling
//!   attempt that have not been written yet.
//!
//! ## Allocation protocol
//!
//! ```text
//! attempt decides      signal_claim_pending_allocation(uid, allocated)
//!      │
//! write to store       (caller)
//!      │
//!  ok ─┼─ assume_claim_after_api_call(updated) ; remove_claim_pending_allocation(uid)
//!      │
//! err ─┴─ remove_claim_pending_allocation(uid)
//! ```
//!
//! The ledger entry covers the whole write, so concurrent attempts calling
//! [`ClaimTracker::list_all_allocated`] see the decision before the store
//! does. A listing that races the final handoff may miss it once; the next
//! listing does not. An attempt that finds a pending allocation for a claim it
//! needs must defer its work unit until the claim changes.
//!
//! ## Modules
//!
//! - `claims`: the claim tracker
//! - `ledger`: in-flight allocation ledgers
//! - `listers`: read-only catalog projections
//! - `manager`: the facade handed to the rest of the scheduler
//! - `config`: environment-driven configuration

mod claims;
mod config;
mod error;
mod framework;
mod ledger;
mod listers;
mod manager;

pub use claims::ClaimTracker;
pub use config::{ConfigError, TrackerConfig};
pub use error::{ListerError, TrackerError, TrackerResult};
pub use framework::{
    AllocationState, DeviceClassLister, ResourceClaimTracker, ResourceSliceLister,
    SharedDraManager,
};
pub use ledger::{InFlightLedger, LeasedLedger, ShardedLedger};
pub use listers::{CatalogStore, DeviceClassStoreLister, ResourceSliceStoreLister};
pub use manager::{Catalog, DraManager};
