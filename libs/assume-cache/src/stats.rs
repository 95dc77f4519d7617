//! Cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache activity.
///
/// All counters use relaxed ordering; they are for monitoring, not for
/// synchronisation.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    assumed: AtomicU64,
    assume_rejected: AtomicU64,
    restored: AtomicU64,
    informer_updates: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_assume(&self) {
        self.assumed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_assume_rejected(&self) {
        self.assume_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_restore(&self) {
        self.restored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_informer_update(&self) {
        self.informer_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Lookups that found the key.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups for absent keys.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Accepted assumes.
    pub fn assumed(&self) -> u64 {
        self.assumed.load(Ordering::Relaxed)
    }

    /// Assumes rejected as stale or for unknown keys.
    pub fn assume_rejected(&self) -> u64 {
        self.assume_rejected.load(Ordering::Relaxed)
    }

    /// Restores that actually discarded an assumed object.
    pub fn restored(&self) -> u64 {
        self.restored.load(Ordering::Relaxed)
    }

    /// Add/update/delete notifications applied from the informer.
    pub fn informer_updates(&self) -> u64 {
        self.informer_updates.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
    }
}
