//! The claim tracker.
//!
//! Combines the claim assume cache with the in-flight ledger. The cache lets
//! a claim written in PreBind be seen as allocated before the informer
//! delivers the update; the ledger covers the window before that write.
//!
//! Without the ledger the following can happen:
//! - Attempt A decides to allocate claim X.
//! - Attempt B shares X, sees it as allocated and gets scheduled.
//! - B's write of `reservedFor` lands first and fails because X is not
//!   really allocated yet.
//!
//! Letting either attempt write the allocation instead leads to a worse
//! outcome when A's write fails after B's succeeded: A restores the assume
//! cache and X looks free although it is allocated. So B defers instead.

use std::sync::Arc;

use dra_api::ResourceClaim;
use dra_assume_cache::AssumeCache;
use dra_id::{ClaimUid, ObjectKey};
use tracing::{debug, instrument, trace};

use crate::error::TrackerResult;
use crate::framework::ResourceClaimTracker;
use crate::ledger::{InFlightLedger, ShardedLedger};

/// Claim view backed by an assume cache and an in-flight ledger.
#[derive(Debug, Clone)]
pub struct ClaimTracker {
    /// Claims keyed by `<namespace>/<name>`. Entries are assumed after a
    /// successful write and superseded by the informer's copy once it is at
    /// least as new.
    cache: Arc<AssumeCache<ResourceClaim>>,

    /// Allocation decisions not yet written, keyed by claim UID.
    in_flight_allocations: Arc<dyn InFlightLedger>,
}

impl ClaimTracker {
    /// Create a tracker over a shared claim cache and ledger.
    pub fn new(
        cache: Arc<AssumeCache<ResourceClaim>>,
        in_flight_allocations: Arc<dyn InFlightLedger>,
    ) -> Self {
        Self {
            cache,
            in_flight_allocations,
        }
    }

    /// Create a tracker with a [`ShardedLedger`] (no expiry).
    pub fn with_sharded_ledger(cache: Arc<AssumeCache<ResourceClaim>>) -> Self {
        Self::new(cache, Arc::new(ShardedLedger::new()))
    }

    /// The underlying claim cache, for wiring informer callbacks.
    pub fn cache(&self) -> &Arc<AssumeCache<ResourceClaim>> {
        &self.cache
    }

    /// The ledger of in-flight allocations.
    pub fn ledger(&self) -> &Arc<dyn InFlightLedger> {
        &self.in_flight_allocations
    }
}

impl ResourceClaimTracker for ClaimTracker {
    fn get(&self, namespace: &str, claim_name: &str) -> TrackerResult<Arc<ResourceClaim>> {
        let key = ObjectKey::namespaced(namespace, claim_name);
        Ok(self.cache.get(&key)?)
    }

    fn get_original(
        &self,
        namespace: &str,
        claim_name: &str,
    ) -> TrackerResult<Arc<ResourceClaim>> {
        let key = ObjectKey::namespaced(namespace, claim_name);
        Ok(self.cache.get_api_obj(&key)?)
    }

    fn list(&self) -> TrackerResult<Vec<Arc<ResourceClaim>>> {
        // Probably not worth adding an index for.
        Ok(self.cache.list())
    }

    #[instrument(skip(self))]
    fn list_all_allocated(&self) -> TrackerResult<Vec<Arc<ResourceClaim>>> {
        let claims = self.list()?;
        let total = claims.len();

        let allocated: Vec<_> = claims
            .into_iter()
            .map(|claim| {
                // The ledger holds a decision newer than anything cached.
                self.in_flight_allocations
                    .load(claim.uid())
                    .unwrap_or(claim)
            })
            .filter(|claim| claim.is_allocated())
            .collect();

        trace!(
            total,
            allocated = allocated.len(),
            in_flight = self.in_flight_allocations.len(),
            "Listed allocated claims"
        );
        Ok(allocated)
    }

    fn assume_claim_after_api_call(&self, claim: Arc<ResourceClaim>) -> TrackerResult<()> {
        Ok(self.cache.assume(claim)?)
    }

    fn assumed_claim_restore(&self, namespace: &str, claim_name: &str) {
        self.cache
            .restore(&ObjectKey::namespaced(namespace, claim_name));
    }

    fn claim_has_pending_allocation(&self, claim_uid: ClaimUid) -> bool {
        self.in_flight_allocations.contains(claim_uid)
    }

    fn signal_claim_pending_allocation(&self, claim_uid: ClaimUid, allocated: Arc<ResourceClaim>) {
        debug!(
            claim_uid = %claim_uid,
            claim = %ObjectKey::namespaced(allocated.namespace(), allocated.name()),
            "Signaled pending allocation"
        );
        self.in_flight_allocations.store(claim_uid, allocated);
    }

    fn remove_claim_pending_allocation(&self, claim_uid: ClaimUid) -> bool {
        let found = self.in_flight_allocations.remove(claim_uid);
        debug!(claim_uid = %claim_uid, found, "Removed pending allocation");
        found
    }
}
