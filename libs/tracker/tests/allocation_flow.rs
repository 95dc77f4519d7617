//! Integration tests for the allocation handoff between scheduling attempts.
//!
//! These tests walk a claim through the full protocol:
//! 1. An attempt signals a pending allocation
//! 2. It writes the claim to the store (simulated)
//! 3. It assumes the written claim and clears the ledger
//! 4. The informer delivers the confirmed claim

use std::sync::Arc;

use anyhow::Result;
use dra_api::{Object, ResourceClaim, ResourceClaimConsumerReference, WatchEvent};
use dra_id::{PodUid, ResourceVersion};
use dra_testing::{allocation, claim, init_tracing};
use dra_tracker::{
    AllocationState, DraManager, ResourceClaimTracker, SharedDraManager, TrackerConfig,
    TrackerError,
};

fn manager() -> DraManager {
    init_tracing();
    let (manager, _catalog) = DraManager::from_config(&TrackerConfig::default());
    manager
}

fn allocated_names(tracker: &dyn ResourceClaimTracker) -> Result<Vec<String>> {
    let mut names: Vec<String> = tracker
        .list_all_allocated()?
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    names.sort();
    Ok(names)
}

#[test]
fn test_successful_allocation_handoff() -> Result<()> {
    let manager = manager();
    let claims = manager.resource_claims();

    let x = claim("default", "x", 10);
    let uid = x.uid();
    manager.claim_tracker().cache().on_add(x.clone());
    assert!(claims.list_all_allocated()?.is_empty());

    // Attempt A decides on an allocation.
    let decided = Arc::new(x.with_allocation(allocation("node-1", "gpu-0")));
    claims.signal_claim_pending_allocation(uid, Arc::clone(&decided));
    assert_eq!(claims.list_all_allocated()?, vec![Arc::clone(&decided)]);

    // The store accepts the write and bumps the version.
    let written = Arc::new(decided.with_resource_version(ResourceVersion::new(11)));
    claims.assume_claim_after_api_call(Arc::clone(&written))?;
    assert!(claims.remove_claim_pending_allocation(uid));

    assert!(!claims.claim_has_pending_allocation(uid));
    assert_eq!(claims.list_all_allocated()?, vec![Arc::clone(&written)]);
    assert_eq!(claims.allocation_state("default", "x")?, AllocationState::Allocated);

    // The informer catches up; the assumed object is superseded.
    manager
        .claim_tracker()
        .cache()
        .apply(WatchEvent::Modified((*written).clone()));
    assert!(!manager.claim_tracker().cache().is_assumed(&x.key()));
    assert_eq!(claims.get_original("default", "x")?, written);
    assert_eq!(allocated_names(claims)?, vec!["x"]);
    Ok(())
}

#[test]
fn test_failed_write_releases_claim() -> Result<()> {
    let manager = manager();
    let claims = manager.resource_claims();

    let x = claim("default", "x", 3);
    manager.claim_tracker().cache().on_add(x.clone());

    claims.signal_claim_pending_allocation(
        x.uid(),
        Arc::new(x.with_allocation(allocation("node-1", "gpu-0"))),
    );
    assert_eq!(
        claims.allocation_state("default", "x")?,
        AllocationState::PendingAllocation
    );

    // The write fails; the attempt abandons its decision.
    assert!(claims.remove_claim_pending_allocation(x.uid()));
    assert!(!claims.remove_claim_pending_allocation(x.uid()));

    assert!(claims.list_all_allocated()?.is_empty());
    assert_eq!(claims.allocation_state("default", "x")?, AllocationState::Free);
    Ok(())
}

#[test]
fn test_shared_claim_defers_second_attempt() -> Result<()> {
    let manager = manager();
    let claims = manager.resource_claims();

    let shared = claim("default", "shared", 1);
    let uid = shared.uid();
    manager.claim_tracker().cache().on_add(shared.clone());

    // Attempt A for pod-a commits to an allocation.
    let pod_a = PodUid::new();
    let decided = shared
        .with_allocation(allocation("node-1", "gpu-0"))
        .with_reservation(ResourceClaimConsumerReference::pod("pod-a", pod_a));
    claims.signal_claim_pending_allocation(uid, Arc::new(decided));

    // Attempt B for pod-b needs the same claim and must not treat it as free.
    let seen_by_b = claims.get("default", "shared")?;
    assert!(!seen_by_b.is_allocated(), "cache has not seen the write yet");
    assert!(claims.claim_has_pending_allocation(seen_by_b.uid()));
    assert!(claims.allocation_state("default", "shared")?.is_pending());

    // The allocated devices still count for B's view of consumption.
    let allocated = claims.list_all_allocated()?;
    assert_eq!(allocated.len(), 1);
    assert!(allocated[0].is_reserved_for(pod_a));
    Ok(())
}

#[test]
fn test_assume_restore_round_trip() -> Result<()> {
    let manager = manager();
    let claims = manager.resource_claims();

    let a = claim("team-a", "claim", 7);
    manager.claim_tracker().cache().on_add(a.clone());

    let b = a
        .with_allocation(allocation("node-3", "gpu-2"))
        .with_resource_version(ResourceVersion::new(8));
    claims.assume_claim_after_api_call(Arc::new(b.clone()))?;

    assert_eq!(*claims.get("team-a", "claim")?, b);
    assert_eq!(*claims.get_original("team-a", "claim")?, a);

    claims.assumed_claim_restore("team-a", "claim");
    assert_eq!(*claims.get("team-a", "claim")?, a);

    // Restoring again, or restoring an unknown key, changes nothing.
    claims.assumed_claim_restore("team-a", "claim");
    claims.assumed_claim_restore("team-a", "unknown");
    assert_eq!(*claims.get("team-a", "claim")?, a);
    Ok(())
}

#[test]
fn test_out_of_order_assume_is_rejected() -> Result<()> {
    let manager = manager();
    let claims = manager.resource_claims();

    let a = claim("default", "x", 1);
    manager.claim_tracker().cache().on_add(a.clone());

    let first = a.with_resource_version(ResourceVersion::new(3));
    claims.assume_claim_after_api_call(Arc::new(first.clone()))?;

    let second = a
        .with_allocation(allocation("node-1", "gpu-0"))
        .with_resource_version(ResourceVersion::new(2));
    let err = claims
        .assume_claim_after_api_call(Arc::new(second))
        .unwrap_err();

    assert!(matches!(err, TrackerError::StaleWrite { .. }));
    assert_eq!(*claims.get("default", "x")?, first);
    assert_eq!(*claims.get_original("default", "x")?, a);
    Ok(())
}

#[test]
fn test_deleted_claim_disappears() -> Result<()> {
    let manager = manager();
    let claims = manager.resource_claims();

    let x: ResourceClaim =
        claim("default", "x", 1).with_allocation(allocation("node-1", "gpu-0"));
    manager.claim_tracker().cache().on_add(x.clone());
    assert_eq!(claims.list_all_allocated()?.len(), 1);

    manager.claim_tracker().cache().apply(WatchEvent::Deleted(x));

    assert!(claims.get("default", "x").unwrap_err().is_not_found());
    assert!(claims.list()?.is_empty());
    assert!(claims.list_all_allocated()?.is_empty());
    Ok(())
}
