//! Cache Metrics
//!
//! Every cache keeps a [`CacheStats`] block inside its lock. The counters are
//! monotone except `size`, which follows the number of entries reachable
//! through the hash table (including entries reserved by an in-flight insert).
//!
//! [`CacheMetrics`] exposes the same numbers as a `BTreeMap<String, f64>` so
//! reports come out in a stable order, whatever the cache's key type.

use std::collections::BTreeMap;

/// Counter snapshot for one cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently reachable through the hash table.
    pub size: usize,
    /// Admission limit.
    pub max_size: usize,
    /// Number of hash buckets.
    pub hash_size: usize,
    /// Lookups that returned a pinned entry, minus hits given back by
    /// `force_delete(.., true)`.
    pub hits: u64,
    /// Public lookup calls.
    pub lookups: u64,
    /// Successful inserts.
    pub insert_ok: u64,
    /// Inserts that failed with `CacheFull`, `Busy` or `DeletePending`.
    pub insert_fail: u64,
    /// Entries finalized, whether evicted, replaced, force-deleted or drained.
    pub deletes: u64,
}

impl CacheStats {
    pub(crate) fn new(max_size: usize, hash_size: usize) -> Self {
        Self {
            max_size,
            hash_size,
            ..Default::default()
        }
    }

    #[inline]
    pub(crate) fn record_lookup(&mut self) {
        self.lookups += 1;
    }

    #[inline]
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Takes back a hit whose entry turned out to be stale.
    #[inline]
    pub(crate) fn uncount_hit(&mut self) {
        self.hits = self.hits.saturating_sub(1);
    }

    #[inline]
    pub(crate) fn record_insert_ok(&mut self) {
        self.insert_ok += 1;
    }

    #[inline]
    pub(crate) fn record_insert_fail(&mut self) {
        self.insert_fail += 1;
    }

    /// An entry left the hash table and was freed.
    #[inline]
    pub(crate) fn record_delete(&mut self) {
        self.size -= 1;
        self.deletes += 1;
    }

    /// Lookups that found nothing.
    pub fn misses(&self) -> u64 {
        self.lookups.saturating_sub(self.hits)
    }

    /// Hits over lookups, in `0.0..=1.0`; zero before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups > 0 {
            self.hits as f64 / self.lookups as f64
        } else {
            0.0
        }
    }

    /// Current size over capacity.
    pub fn utilization(&self) -> f64 {
        if self.max_size > 0 {
            self.size as f64 / self.max_size as f64
        } else {
            0.0
        }
    }

    /// All counters and derived ratios, keyed by name.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("size".to_string(), self.size as f64);
        metrics.insert("max_size".to_string(), self.max_size as f64);
        metrics.insert("hash_size".to_string(), self.hash_size as f64);
        metrics.insert("lookups".to_string(), self.lookups as f64);
        metrics.insert("hits".to_string(), self.hits as f64);
        metrics.insert("misses".to_string(), self.misses() as f64);
        metrics.insert("insert_ok".to_string(), self.insert_ok as f64);
        metrics.insert("insert_fail".to_string(), self.insert_fail as f64);
        metrics.insert("deletes".to_string(), self.deletes as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("utilization".to_string(), self.utilization());
        metrics
    }
}

/// Common reporting interface for caches.
pub trait CacheMetrics {
    /// Returns all metrics as name/value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short name of the replacement scheme.
    fn algorithm_name(&self) -> &'static str;
}
