//! Read-only catalog listers.
//!
//! Device classes and resource slices carry no allocation state. They are
//! mirrored into a [`CatalogStore`] by the informer and read through thin
//! lister wrappers.

use std::collections::BTreeMap;
use std::sync::Arc;

use dra_api::{DeviceClass, Object, ResourceSlice, WatchEvent};
use dra_id::ObjectKey;
use parking_lot::RwLock;
use tracing::trace;

use crate::error::ListerError;
use crate::framework::{DeviceClassLister, ResourceSliceLister};

/// Indexed store of cluster-scoped objects, maintained from watch events.
#[derive(Debug)]
pub struct CatalogStore<T> {
    objects: RwLock<BTreeMap<ObjectKey, Arc<T>>>,
}

impl<T> Default for CatalogStore<T> {
    fn default() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: Object> CatalogStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one change notification.
    ///
    /// Out-of-order updates (older than what is stored) are dropped.
    pub fn apply(&self, event: WatchEvent<T>) {
        match event {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) => self.upsert(obj),
            WatchEvent::Deleted(obj) => self.remove(&obj.key()),
        }
    }

    /// Insert or replace an object.
    pub fn upsert(&self, obj: T) {
        let key = obj.key();
        let mut objects = self.objects.write();
        if let Some(existing) = objects.get(&key) {
            if existing.resource_version() > obj.resource_version() {
                trace!(kind = T::KIND, key = %key, "Dropped out-of-order update");
                return;
            }
        }
        objects.insert(key, Arc::new(obj));
    }

    pub fn remove(&self, key: &ObjectKey) {
        self.objects.write().remove(key);
    }

    pub fn get(&self, key: &ObjectKey) -> Option<Arc<T>> {
        self.objects.read().get(key).cloned()
    }

    /// All objects, ordered by key.
    pub fn list(&self) -> Vec<Arc<T>> {
        self.objects.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

/// [`ResourceSliceLister`] over a [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct ResourceSliceStoreLister {
    store: Arc<CatalogStore<ResourceSlice>>,
}

impl ResourceSliceStoreLister {
    pub fn new(store: Arc<CatalogStore<ResourceSlice>>) -> Self {
        Self { store }
    }
}

impl ResourceSliceLister for ResourceSliceStoreLister {
    fn list(&self) -> Result<Vec<Arc<ResourceSlice>>, ListerError> {
        Ok(self.store.list())
    }
}

/// [`DeviceClassLister`] over a [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct DeviceClassStoreLister {
    store: Arc<CatalogStore<DeviceClass>>,
}

impl DeviceClassStoreLister {
    pub fn new(store: Arc<CatalogStore<DeviceClass>>) -> Self {
        Self { store }
    }
}

impl DeviceClassLister for DeviceClassStoreLister {
    fn get(&self, class_name: &str) -> Result<Arc<DeviceClass>, ListerError> {
        self.store
            .get(&ObjectKey::cluster(class_name))
            .ok_or_else(|| ListerError::NotFound {
                kind: DeviceClass::KIND,
                name: class_name.to_string(),
            })
    }

    fn list(&self) -> Result<Vec<Arc<DeviceClass>>, ListerError> {
        Ok(self.store.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dra_id::ResourceVersion;
    use dra_testing::{device_class, resource_slice};

    #[test]
    fn test_device_class_get() {
        let store = Arc::new(CatalogStore::new());
        store.apply(WatchEvent::Added(device_class("gpu.example.com")));
        let lister = DeviceClassStoreLister::new(store);

        assert_eq!(lister.get("gpu.example.com").unwrap().name(), "gpu.example.com");
        assert_eq!(
            lister.get("fpga.example.com").unwrap_err(),
            ListerError::NotFound {
                kind: "DeviceClass",
                name: "fpga.example.com".to_string()
            }
        );
        assert_eq!(lister.list().unwrap().len(), 1);
    }

    #[test]
    fn test_slice_list_follows_watch_events() {
        let store = Arc::new(CatalogStore::new());
        let lister = ResourceSliceStoreLister::new(Arc::clone(&store));

        let slice = resource_slice("node-1", 2);
        store.apply(WatchEvent::Added(slice.clone()));
        store.apply(WatchEvent::Added(resource_slice("node-2", 4)));
        assert_eq!(lister.list().unwrap().len(), 2);

        store.apply(WatchEvent::Deleted(slice));
        let remaining = lister.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].spec.devices.len(), 4);
    }

    #[test]
    fn test_store_drops_out_of_order_updates() {
        let store = CatalogStore::new();
        let mut newer = device_class("gpu.example.com");
        newer.metadata.resource_version = ResourceVersion::new(5);
        let mut older = newer.clone();
        older.metadata.resource_version = ResourceVersion::new(3);

        store.upsert(newer);
        store.upsert(older);

        let stored = store.get(&ObjectKey::cluster("gpu.example.com")).unwrap();
        assert_eq!(stored.resource_version(), ResourceVersion::new(5));
    }
}
