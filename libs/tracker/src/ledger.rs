//! In-flight allocation ledgers.
//!
//! A ledger maps a claim UID to the allocated claim a scheduling attempt has
//! decided on but not yet written. Writers almost always touch disjoint
//! UIDs (claims are rarely shared between pods), so the implementations use
//! a sharded map instead of a single lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dra_api::{Object, ResourceClaim};
use dra_id::ClaimUid;
use tracing::{trace, warn};

/// Storage for in-flight allocation decisions.
///
/// Each method is atomic on its own.
pub trait InFlightLedger: Send + Sync + std::fmt::Debug {
    /// Returns true if a decision is recorded for `uid`.
    fn contains(&self, uid: ClaimUid) -> bool;

    /// The recorded decision for `uid`.
    fn load(&self, uid: ClaimUid) -> Option<Arc<ResourceClaim>>;

    /// Record a decision, replacing any previous one for `uid`.
    fn store(&self, uid: ClaimUid, claim: Arc<ResourceClaim>);

    /// Remove the decision for `uid`. Returns whether one was recorded.
    fn remove(&self, uid: ClaimUid) -> bool;

    /// Number of recorded decisions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ledger without expiry. Entries live until removed.
#[derive(Debug, Default)]
pub struct ShardedLedger {
    entries: DashMap<ClaimUid, Arc<ResourceClaim>>,
}

impl ShardedLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InFlightLedger for ShardedLedger {
    fn contains(&self, uid: ClaimUid) -> bool {
        self.entries.contains_key(&uid)
    }

    fn load(&self, uid: ClaimUid) -> Option<Arc<ResourceClaim>> {
        // Clone the Arc and drop the shard guard immediately.
        self.entries.get(&uid).map(|r| Arc::clone(r.value()))
    }

    fn store(&self, uid: ClaimUid, claim: Arc<ResourceClaim>) {
        self.entries.insert(uid, claim);
    }

    fn remove(&self, uid: ClaimUid) -> bool {
        self.entries.remove(&uid).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug)]
struct LeasedEntry {
    claim: Arc<ResourceClaim>,
    signaled_at: Instant,
}

/// Ledger whose entries expire after a lease.
///
/// This is an opt-in extension for long-running processes: an attempt that
/// dies between signaling and removing would otherwise block the claim until
/// restart. Expired entries read as absent and are dropped on access or by
/// [`expire_stale`](Self::expire_stale).
///
/// The lease must be longer than the slowest store write, or a live
/// decision may expire while its write is still in progress.
#[derive(Debug)]
pub struct LeasedLedger {
    entries: DashMap<ClaimUid, LeasedEntry>,
    lease: Duration,
}

impl LeasedLedger {
    pub fn new(lease: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            lease,
        }
    }

    /// The configured lease.
    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Drop every expired entry and return the affected UIDs.
    pub fn expire_stale(&self) -> Vec<ClaimUid> {
        let now = Instant::now();
        let mut expired = Vec::new();
        self.entries.retain(|uid, entry| {
            if self.is_expired(entry, now) {
                warn!(
                    claim_uid = %uid,
                    claim = %entry.claim.key(),
                    lease_secs = self.lease.as_secs(),
                    "Expired in-flight allocation that was never cleared"
                );
                expired.push(*uid);
                false
            } else {
                true
            }
        });
        expired
    }

    fn is_expired(&self, entry: &LeasedEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.signaled_at) >= self.lease
    }

    /// Remove `uid` if its lease is over. Returns true if it was removed.
    fn evict_if_expired(&self, uid: ClaimUid) -> bool {
        let now = Instant::now();
        let evicted = self
            .entries
            .remove_if(&uid, |_, entry| self.is_expired(entry, now))
            .is_some();
        if evicted {
            warn!(claim_uid = %uid, "Expired in-flight allocation on access");
        }
        evicted
    }
}

impl InFlightLedger for LeasedLedger {
    fn contains(&self, uid: ClaimUid) -> bool {
        !self.evict_if_expired(uid) && self.entries.contains_key(&uid)
    }

    fn load(&self, uid: ClaimUid) -> Option<Arc<ResourceClaim>> {
        if self.evict_if_expired(uid) {
            return None;
        }
        self.entries.get(&uid).map(|r| Arc::clone(&r.value().claim))
    }

    fn store(&self, uid: ClaimUid, claim: Arc<ResourceClaim>) {
        trace!(claim_uid = %uid, "Leased in-flight allocation");
        self.entries.insert(
            uid,
            LeasedEntry {
                claim,
                signaled_at: Instant::now(),
            },
        );
    }

    fn remove(&self, uid: ClaimUid) -> bool {
        match self.entries.remove(&uid) {
            Some((_, entry)) => !self.is_expired(&entry, Instant::now()),
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
