//! The DRA manager: one access point for claims and catalogs.

use std::sync::Arc;

use dra_api::{DeviceClass, ResourceClaim, ResourceSlice};
use dra_assume_cache::AssumeCache;
use tracing::info;

use crate::claims::ClaimTracker;
use crate::config::TrackerConfig;
use crate::framework::{
    DeviceClassLister, ResourceClaimTracker, ResourceSliceLister, SharedDraManager,
};
use crate::listers::{CatalogStore, DeviceClassStoreLister, ResourceSliceStoreLister};

/// Informer-maintained catalog stores.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub device_classes: Arc<CatalogStore<DeviceClass>>,
    pub resource_slices: Arc<CatalogStore<ResourceSlice>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Bundles the claim tracker with the catalog listers.
///
/// Built once per scheduler process.
#[derive(Debug, Clone)]
pub struct DraManager {
    resource_claim_tracker: ClaimTracker,
    resource_slice_lister: ResourceSliceStoreLister,
    device_class_lister: DeviceClassStoreLister,
}

impl DraManager {
    /// Create a manager over a shared claim cache and the catalog stores.
    pub fn new(
        claims_cache: Arc<AssumeCache<ResourceClaim>>,
        catalog: &Catalog,
        config: &TrackerConfig,
    ) -> Self {
        info!(
            ledger_lease = ?config.ledger_lease,
            cache_event_capacity = config.cache_event_capacity,
            "Creating DRA manager"
        );

        Self {
            resource_claim_tracker: ClaimTracker::new(claims_cache, config.build_ledger()),
            resource_slice_lister: ResourceSliceStoreLister::new(Arc::clone(
                &catalog.resource_slices,
            )),
            device_class_lister: DeviceClassStoreLister::new(Arc::clone(&catalog.device_classes)),
        }
    }

    /// Create a manager with fresh stores sized by `config`.
    pub fn from_config(config: &TrackerConfig) -> (Self, Catalog) {
        let cache = Arc::new(AssumeCache::with_event_capacity(config.cache_event_capacity));
        let catalog = Catalog::new();
        (Self::new(cache, &catalog, config), catalog)
    }

    /// The concrete claim tracker, for informer wiring.
    pub fn claim_tracker(&self) -> &ClaimTracker {
        &self.resource_claim_tracker
    }
}

impl SharedDraManager for DraManager {
    fn resource_claims(&self) -> &dyn ResourceClaimTracker {
        &self.resource_claim_tracker
    }

    fn resource_slices(&self) -> &dyn ResourceSliceLister {
        &self.resource_slice_lister
    }

    fn device_classes(&self) -> &dyn DeviceClassLister {
        &self.device_class_lister
    }
}
