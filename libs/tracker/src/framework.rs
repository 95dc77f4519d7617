//! Interfaces the rest of the scheduler programs against.

use std::sync::Arc;

use dra_api::{DeviceClass, ResourceClaim, ResourceSlice};
use dra_id::ClaimUid;

use crate::error::{ListerError, TrackerResult};

/// Allocation state of a claim as seen by one scheduling attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationState {
    /// Nothing is committed to the claim.
    Free,

    /// Another attempt has decided on an allocation that is not written yet.
    /// Work units needing this claim must wait for the next claim change.
    PendingAllocation,

    /// Devices are committed, either confirmed by the store or assumed after
    /// a successful write.
    Allocated,
}

impl AllocationState {
    /// Returns true if the claim may be allocated by the caller.
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    /// Returns true if the caller must defer.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingAllocation)
    }
}

/// Claim view of the scheduler.
pub trait ResourceClaimTracker: Send + Sync {
    /// Latest known version of a claim, assumed if there is one.
    fn get(&self, namespace: &str, claim_name: &str) -> TrackerResult<Arc<ResourceClaim>>;

    /// Version last reported by the informer.
    fn get_original(&self, namespace: &str, claim_name: &str)
        -> TrackerResult<Arc<ResourceClaim>>;

    /// Every cached claim.
    fn list(&self) -> TrackerResult<Vec<Arc<ResourceClaim>>>;

    /// Every claim that is allocated or has an in-flight allocation.
    fn list_all_allocated(&self) -> TrackerResult<Vec<Arc<ResourceClaim>>>;

    /// Record a claim written to the store so reads see it before the
    /// informer does.
    fn assume_claim_after_api_call(&self, claim: Arc<ResourceClaim>) -> TrackerResult<()>;

    /// Drop the assumed version of a claim.
    fn assumed_claim_restore(&self, namespace: &str, claim_name: &str);

    fn claim_has_pending_allocation(&self, claim_uid: ClaimUid) -> bool;

    /// Record an allocation decision before writing it.
    fn signal_claim_pending_allocation(&self, claim_uid: ClaimUid, allocated: Arc<ResourceClaim>);

    /// Forget an allocation decision. Returns whether one was recorded.
    fn remove_claim_pending_allocation(&self, claim_uid: ClaimUid) -> bool;

    /// Classify a claim for a scheduling attempt.
    fn allocation_state(&self, namespace: &str, claim_name: &str) -> TrackerResult<AllocationState> {
        let claim = self.get(namespace, claim_name)?;
        if self.claim_has_pending_allocation(claim.uid()) {
            Ok(AllocationState::PendingAllocation)
        } else if claim.is_allocated() {
            Ok(AllocationState::Allocated)
        } else {
            Ok(AllocationState::Free)
        }
    }
}

/// Read-only view of resource slices.
pub trait ResourceSliceLister: Send + Sync {
    fn list(&self) -> Result<Vec<Arc<ResourceSlice>>, ListerError>;
}

/// Read-only view of device classes.
pub trait DeviceClassLister: Send + Sync {
    fn get(&self, class_name: &str) -> Result<Arc<DeviceClass>, ListerError>;

    fn list(&self) -> Result<Vec<Arc<DeviceClass>>, ListerError>;
}

/// Everything the scheduler needs for dynamic resource allocation.
pub trait SharedDraManager: Send + Sync {
    fn resource_claims(&self) -> &dyn ResourceClaimTracker;

    fn resource_slices(&self) -> &dyn ResourceSliceLister;

    fn device_classes(&self) -> &dyn DeviceClassLister;
}
