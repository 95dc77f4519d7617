//! The assume cache.
//!
//! Informer callbacks feed [`AssumeCache::on_add`], [`AssumeCache::on_update`]
//! and [`AssumeCache::on_delete`]. The scheduler calls
//! [`AssumeCache::assume`] after it has written a newer version to the store
//! and [`AssumeCache::restore`] when that assumption must be dropped.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use dra_api::{Object, WatchEvent};
use dra_id::ObjectKey;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::error::{CacheError, CacheResult};
use crate::event::CacheEvent;
use crate::stats::CacheStats;

/// Default capacity of the change notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Both versions known for one key.
#[derive(Debug)]
struct ObjectInfo<T> {
    /// Last version reported by the informer.
    api_obj: Arc<T>,
    /// Version exposed to readers: either `api_obj` or a newer assumed one.
    latest_obj: Arc<T>,
}

impl<T> ObjectInfo<T> {
    fn new(obj: Arc<T>) -> Self {
        Self {
            latest_obj: Arc::clone(&obj),
            api_obj: obj,
        }
    }

    fn is_assumed(&self) -> bool {
        !Arc::ptr_eq(&self.api_obj, &self.latest_obj)
    }
}

/// Result of applying one informer object.
enum Upsert<T> {
    Stored(CacheEvent<T>),
    Hidden,
    /// Older than the informer version already held.
    OutOfOrder,
}

/// Optimistic cache for one object kind.
///
/// Thread-safe; all methods take `&self`.
pub struct AssumeCache<T: Object> {
    objects: RwLock<HashMap<ObjectKey, ObjectInfo<T>>>,
    events: broadcast::Sender<CacheEvent<T>>,
    stats: CacheStats,
}

impl<T: Object> Default for AssumeCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Object> std::fmt::Debug for AssumeCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumeCache")
            .field("kind", &T::KIND)
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Object> AssumeCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty cache whose change channel buffers `capacity` events
    /// per subscriber before lagging.
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            objects: RwLock::new(HashMap::new()),
            events,
            stats: CacheStats::new(),
        }
    }

    /// Cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of keys in the cache.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Subscribe to changes of exposed versions.
    ///
    /// Events are only delivered for changes made after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent<T>> {
        self.events.subscribe()
    }

    /// Latest version for `key`: the assumed object if there is one, the API
    /// object otherwise.
    pub fn get(&self, key: &ObjectKey) -> CacheResult<Arc<T>> {
        self.lookup(key, |info| &info.latest_obj)
    }

    /// The informer's version for `key`, ignoring any assumed object.
    pub fn get_api_obj(&self, key: &ObjectKey) -> CacheResult<Arc<T>> {
        self.lookup(key, |info| &info.api_obj)
    }

    /// Returns true if `key` currently exposes an assumed object.
    pub fn is_assumed(&self, key: &ObjectKey) -> bool {
        self.objects
            .read()
            .get(key)
            .map(ObjectInfo::is_assumed)
            .unwrap_or(false)
    }

    /// Latest version of every cached object, in no particular order.
    pub fn list(&self) -> Vec<Arc<T>> {
        self.objects
            .read()
            .values()
            .map(|info| Arc::clone(&info.latest_obj))
            .collect()
    }

    /// Latest version of every cached object matching `filter`.
    pub fn list_matching<F>(&self, filter: F) -> Vec<Arc<T>>
    where
        F: Fn(&T) -> bool,
    {
        self.objects
            .read()
            .values()
            .filter(|info| filter(&info.latest_obj))
            .map(|info| Arc::clone(&info.latest_obj))
            .collect()
    }

    /// Expose `obj` as the latest version of its key until the informer
    /// reports something at least as new, or [`restore`](Self::restore) is
    /// called.
    ///
    /// The key must already be known from the informer and `obj` must be
    /// strictly newer than the version currently exposed. On error nothing
    /// changes.
    pub fn assume(&self, obj: impl Into<Arc<T>>) -> CacheResult<()> {
        let obj: Arc<T> = obj.into();
        let key = obj.key();
        let assumed = obj.resource_version();

        let mut objects = self.objects.write();
        let Some(info) = objects.get_mut(&key) else {
            self.stats.record_assume_rejected();
            warn!(kind = T::KIND, key = %key, "Cannot assume object that is not cached");
            return Err(CacheError::NotFound { kind: T::KIND, key });
        };

        let stored = info.latest_obj.resource_version();
        if assumed <= stored {
            self.stats.record_assume_rejected();
            warn!(
                kind = T::KIND,
                key = %key,
                stored = %stored,
                assumed = %assumed,
                "Rejected assume of stale object"
            );
            return Err(CacheError::StaleVersion {
                kind: T::KIND,
                key,
                stored,
                assumed,
            });
        }

        let old = std::mem::replace(&mut info.latest_obj, Arc::clone(&obj));
        drop(objects);

        self.stats.record_assume();
        debug!(kind = T::KIND, key = %key, version = %assumed, "Assumed object");
        self.notify(CacheEvent::Updated { old, new: obj });
        Ok(())
    }

    /// Drop the assumed object for `key`, if any, and expose the informer's
    /// version again.
    pub fn restore(&self, key: &ObjectKey) {
        let mut objects = self.objects.write();
        let Some(info) = objects.get_mut(key) else {
            trace!(kind = T::KIND, key = %key, "Restore of unknown key ignored");
            return;
        };
        if !info.is_assumed() {
            return;
        }

        let api_obj = Arc::clone(&info.api_obj);
        let old = std::mem::replace(&mut info.latest_obj, Arc::clone(&api_obj));
        drop(objects);

        self.stats.record_restore();
        debug!(
            kind = T::KIND,
            key = %key,
            version = %api_obj.resource_version(),
            "Restored informer object"
        );
        self.notify(CacheEvent::Updated { old, new: api_obj });
    }

    /// Informer callback for a newly observed object.
    pub fn on_add(&self, obj: impl Into<Arc<T>>) {
        self.upsert(obj.into());
    }

    /// Informer callback for an updated object.
    pub fn on_update(&self, obj: impl Into<Arc<T>>) {
        self.upsert(obj.into());
    }

    /// Informer callback for a deleted object.
    pub fn on_delete(&self, key: &ObjectKey) {
        let removed = self.objects.write().remove(key);
        self.stats.record_informer_update();

        match removed {
            Some(info) => {
                debug!(kind = T::KIND, key = %key, "Deleted object");
                self.notify(CacheEvent::Deleted(info.latest_obj));
            }
            None => trace!(kind = T::KIND, key = %key, "Delete of unknown key ignored"),
        }
    }

    /// Apply one change notification from the store's watch stream.
    pub fn apply(&self, event: WatchEvent<T>) {
        match event {
            WatchEvent::Added(obj) => self.on_add(obj),
            WatchEvent::Modified(obj) => self.on_update(obj),
            WatchEvent::Deleted(obj) => self.on_delete(&obj.key()),
        }
    }

    fn upsert(&self, obj: Arc<T>) {
        let key = obj.key();
        let version = obj.resource_version();
        self.stats.record_informer_update();

        let mut objects = self.objects.write();
        let outcome = match objects.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(ObjectInfo::new(Arc::clone(&obj)));
                Upsert::Stored(CacheEvent::Added(obj))
            }
            Entry::Occupied(mut slot) => {
                let info = slot.get_mut();
                if version < info.api_obj.resource_version() {
                    Upsert::OutOfOrder
                } else if info.latest_obj.resource_version() > version {
                    // Assumed object is still newer; keep exposing it.
                    info.api_obj = obj;
                    Upsert::Hidden
                } else {
                    let old = std::mem::replace(&mut info.latest_obj, Arc::clone(&obj));
                    info.api_obj = Arc::clone(&obj);
                    Upsert::Stored(CacheEvent::Updated { old, new: obj })
                }
            }
        };
        drop(objects);

        match outcome {
            Upsert::Stored(event) => {
                trace!(kind = T::KIND, key = %key, version = %version, "Informer object stored");
                self.notify(event);
            }
            Upsert::Hidden => trace!(
                kind = T::KIND,
                key = %key,
                version = %version,
                "Informer object hidden by newer assumed object"
            ),
            Upsert::OutOfOrder => trace!(
                kind = T::KIND,
                key = %key,
                version = %version,
                "Dropped out-of-order update"
            ),
        }
    }

    fn lookup<F>(&self, key: &ObjectKey, select: F) -> CacheResult<Arc<T>>
    where
        F: Fn(&ObjectInfo<T>) -> &Arc<T>,
    {
        match self.objects.read().get(key) {
            Some(info) => {
                self.stats.record_hit();
                Ok(Arc::clone(select(info)))
            }
            None => {
                self.stats.record_miss();
                Err(CacheError::NotFound {
                    kind: T::KIND,
                    key: key.clone(),
                })
            }
        }
    }

    fn notify(&self, event: CacheEvent<T>) {
        // No receivers is not an error: nobody is waiting on changes.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dra_api::ResourceClaim;
    use dra_id::ResourceVersion;
    use dra_testing::{allocation, claim};
    use rstest::rstest;

    fn key() -> ObjectKey {
        ObjectKey::namespaced("default", "gpu-claim")
    }

    #[test]
    fn test_get_missing_key() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let err = cache.get(&key()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "ResourceClaim default/gpu-claim not found");
        assert!(cache.get_api_obj(&key()).unwrap_err().is_not_found());
        assert_eq!(cache.stats().misses(), 2);
    }

    #[test]
    fn test_assume_and_restore() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());

        let assumed = original
            .with_allocation(allocation("node-1", "gpu-0"))
            .with_resource_version(ResourceVersion::new(2));
        cache.assume(assumed.clone()).unwrap();

        assert!(cache.is_assumed(&key()));
        assert_eq!(*cache.get(&key()).unwrap(), assumed);
        assert_eq!(*cache.get_api_obj(&key()).unwrap(), original);

        cache.restore(&key());
        assert!(!cache.is_assumed(&key()));
        assert_eq!(*cache.get(&key()).unwrap(), original);
        assert_eq!(cache.stats().assumed(), 1);
        assert_eq!(cache.stats().restored(), 1);
    }

    #[rstest]
    #[case::same_version(5)]
    #[case::older_version(4)]
    fn test_assume_rejects_not_newer(#[case] version: u64) {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 5);
        cache.on_add(original.clone());

        let stale = original
            .with_allocation(allocation("node-1", "gpu-0"))
            .with_resource_version(ResourceVersion::new(version));
        let err = cache.assume(stale).unwrap_err();

        assert!(err.is_stale());
        assert!(!cache.is_assumed(&key()));
        assert_eq!(*cache.get(&key()).unwrap(), original);
        assert_eq!(cache.stats().assume_rejected(), 1);
    }

    #[test]
    fn test_assume_rejects_older_than_assumed() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());

        let newer = original.with_resource_version(ResourceVersion::new(3));
        cache.assume(newer.clone()).unwrap();

        let between = original.with_resource_version(ResourceVersion::new(2));
        assert!(cache.assume(between).unwrap_err().is_stale());
        assert_eq!(*cache.get(&key()).unwrap(), newer);
    }

    #[test]
    fn test_assume_unknown_key() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let err = cache.assume(claim("default", "gpu-claim", 1)).unwrap_err();
        assert!(err.is_not_found());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_restore_without_assumed_is_noop() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());

        cache.restore(&key());
        cache.restore(&ObjectKey::namespaced("default", "other"));

        assert_eq!(*cache.get(&key()).unwrap(), original);
        assert_eq!(cache.stats().restored(), 0);
    }

    #[test]
    fn test_informer_update_keeps_newer_assumed() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());

        let assumed = original.with_resource_version(ResourceVersion::new(5));
        cache.assume(assumed.clone()).unwrap();

        // An unrelated, older write arrives from the informer.
        let intermediate = original.with_resource_version(ResourceVersion::new(3));
        cache.on_update(intermediate.clone());

        assert_eq!(*cache.get(&key()).unwrap(), assumed);
        assert_eq!(*cache.get_api_obj(&key()).unwrap(), intermediate);
    }

    #[test]
    fn test_informer_update_older_than_api_obj_is_dropped() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let current = claim("default", "gpu-claim", 5);
        cache.on_add(current.clone());

        cache.on_update(current.with_resource_version(ResourceVersion::new(3)));

        assert!(!cache.is_assumed(&key()));
        assert_eq!(*cache.get_api_obj(&key()).unwrap(), current);

        cache.restore(&key());
        assert_eq!(
            cache.get(&key()).unwrap().resource_version(),
            ResourceVersion::new(5)
        );
    }

    #[test]
    fn test_informer_update_older_than_api_obj_keeps_assumed() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());
        let assumed = original.with_resource_version(ResourceVersion::new(5));
        cache.assume(assumed.clone()).unwrap();

        let intermediate = original.with_resource_version(ResourceVersion::new(3));
        cache.on_update(intermediate.clone());
        cache.on_update(original.with_resource_version(ResourceVersion::new(2)));

        assert_eq!(*cache.get(&key()).unwrap(), assumed);
        assert_eq!(*cache.get_api_obj(&key()).unwrap(), intermediate);

        cache.restore(&key());
        assert_eq!(*cache.get(&key()).unwrap(), intermediate);
    }

    #[rstest]
    #[case::equal(5)]
    #[case::newer(6)]
    fn test_informer_update_supersedes_assumed(#[case] version: u64) {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());
        cache
            .assume(original.with_resource_version(ResourceVersion::new(5)))
            .unwrap();

        let confirmed = original.with_resource_version(ResourceVersion::new(version));
        cache.on_update(confirmed.clone());

        assert!(!cache.is_assumed(&key()));
        assert_eq!(*cache.get(&key()).unwrap(), confirmed);
    }

    #[test]
    fn test_delete_removes_both_versions() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());
        cache
            .assume(original.with_resource_version(ResourceVersion::new(2)))
            .unwrap();

        cache.apply(WatchEvent::Deleted(original));

        assert!(cache.get(&key()).unwrap_err().is_not_found());
        assert!(cache.get_api_obj(&key()).unwrap_err().is_not_found());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_list_matching() {
        let cache = AssumeCache::<ResourceClaim>::new();
        cache.on_add(claim("default", "a", 1));
        cache.on_add(claim("default", "b", 1));
        cache.on_add(claim("other", "c", 1));

        assert_eq!(cache.list().len(), 3);
        let default_ns = cache.list_matching(|c| c.namespace() == "default");
        assert_eq!(default_ns.len(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_exposed_changes() {
        let cache = AssumeCache::<ResourceClaim>::new();
        let mut events = cache.subscribe();

        let original = claim("default", "gpu-claim", 1);
        cache.on_add(original.clone());
        let assumed = original.with_resource_version(ResourceVersion::new(3));
        cache.assume(assumed.clone()).unwrap();
        // Hidden behind the assumed object: no event.
        cache.on_update(original.with_resource_version(ResourceVersion::new(2)));
        cache.restore(&key());
        cache.on_delete(&key());

        assert!(matches!(events.recv().await.unwrap(), CacheEvent::Added(_)));
        match events.recv().await.unwrap() {
            CacheEvent::Updated { old, new } => {
                assert_eq!(*old, original);
                assert_eq!(*new, assumed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match events.recv().await.unwrap() {
            CacheEvent::Updated { new, .. } => {
                assert_eq!(new.resource_version(), ResourceVersion::new(2));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(events.recv().await.unwrap(), CacheEvent::Deleted(_)));
        assert!(events.try_recv().is_err());
    }
}
