//! Correctness Tests for the Pinned Cache
//!
//! These tests drive the public API through small, deterministic scenarios
//! and check which entries survive, what the counters say, and that the
//! structural invariants hold after every step.
//!
//! ## Test Strategy
//! - Tiny caches (2-4 entries) so every eviction is predictable
//! - Explicit pin bookkeeping: guards are held or dropped on purpose
//! - `check_invariants` after each scenario

use pincache::{Cache, CacheConfig, CacheError, CacheMetrics, EntryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// HELPERS
// ============================================================================

fn make_cache<V>(max_size: usize, hash_size: usize) -> Cache<&'static str, V>
where
    V: Send + Sync + 'static,
{
    Cache::new(CacheConfig::new(max_size, hash_size).unwrap()).unwrap()
}

/// Entry policy that counts cleanups.
struct Tracked(Arc<AtomicUsize>);

impl EntryPolicy<&'static str, u32> for Tracked {
    fn key_eq(&self, lookup: &&'static str, stored: &&'static str) -> bool {
        lookup == stored
    }

    fn cleanup(&self, _data: u32) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_insert_then_lookup_round_trip() {
    let cache = make_cache(4, 8);

    let inserted = cache.insert_default("a", 1u32).unwrap();
    let found = cache.lookup(&"a").unwrap();
    assert_eq!(*found, 1);
    assert_eq!(cache.pin_count(&found), 2);

    cache.release(inserted);
    cache.release(found);

    let stats = cache.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.lookups, 1);

    // Releasing everything leaves a single unpinned entry behind.
    let again = cache.lookup(&"a").unwrap();
    assert_eq!(again.pin_count(), 1);
    drop(again);
    assert_eq!(cache.len(), 1);
    cache.check_invariants().unwrap();
}

#[test]
fn test_full_cache_evicts_only_after_release() {
    // max 2 / hash 4: A and B pinned, C cannot get in until A is released.
    let cache = make_cache(2, 4);
    let a = cache.insert_default("A", 1u32).unwrap();
    let b = cache.insert_default("B", 2u32).unwrap();

    assert_eq!(cache.insert_default("C", 3).unwrap_err(), CacheError::CacheFull);
    assert_eq!(cache.stats().insert_fail, 1);
    assert_eq!(cache.len(), 2);

    cache.release(a);
    let c = cache.insert_default("C", 3).unwrap();
    assert!(cache.lookup(&"A").is_none());
    cache.release(c);

    let c = cache.lookup(&"C").unwrap();
    assert_eq!(*c, 3);
    assert_eq!(*cache.lookup(&"B").unwrap(), 2);

    drop((b, c));
    cache.check_invariants().unwrap();
}

#[test]
fn test_capacity_n_with_n_pins() {
    const N: usize = 4;
    let keys = ["k0", "k1", "k2", "k3"];
    let cache = make_cache(N, N);

    let mut pins: Vec<_> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| cache.insert_default(*key, i).unwrap())
        .collect();

    assert_eq!(cache.insert_default("extra", 99).unwrap_err(), CacheError::CacheFull);
    let stats = cache.stats();
    assert_eq!(stats.insert_fail, 1);
    assert_eq!(stats.size, N);

    // Release k2; the retry evicts it.
    drop(pins.remove(2));
    let extra = cache.insert_default("extra", 99).unwrap();
    assert!(cache.lookup(&"k2").is_none());
    assert_eq!(cache.len(), N);
    assert_eq!(cache.stats().deletes, 1);

    drop(extra);
    drop(pins);
    cache.check_invariants().unwrap();
}

#[test]
fn test_duplicate_key_with_outstanding_pin() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let policy: Arc<dyn EntryPolicy<&'static str, u32>> = Arc::new(Tracked(Arc::clone(&cleaned)));
    let cache = make_cache(4, 4);

    let first = cache.insert("A", 1, Arc::clone(&policy)).unwrap();
    assert!(cache.insert("A", 2, Arc::clone(&policy)).is_err());
    assert_eq!(cache.stats().insert_fail, 1);
    assert_eq!(*first, 1);
    assert_eq!(cleaned.load(Ordering::SeqCst), 0);

    cache.release(first);
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);

    let second = cache.insert("A", 2, Arc::clone(&policy)).unwrap();
    cache.release(second);
    assert_eq!(*cache.lookup(&"A").unwrap(), 2);
    assert_eq!(cache.len(), 1);
    cache.check_invariants().unwrap();
}

#[test]
fn test_duplicate_key_without_pins_replaces() {
    let cache = make_cache(4, 4);
    drop(cache.insert_default("A", 1u32).unwrap());
    drop(cache.insert_default("A", 2u32).unwrap());

    assert_eq!(*cache.lookup(&"A").unwrap(), 2);
    let stats = cache.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.insert_ok, 2);
    assert_eq!(stats.deletes, 1);
}

#[test]
fn test_pending_entry_is_invisible() {
    let cache = make_cache(4, 4);
    let holder = cache.insert_default("A", 1u32).unwrap();
    let deleter = holder.repin().unwrap();

    assert_eq!(cache.force_delete(deleter, false), Err(CacheError::Busy));
    assert!(!holder.is_valid());
    assert!(cache.lookup(&"A").is_none());
    assert_eq!(cache.lookup_status(&"A").unwrap_err(), CacheError::DeletePending);

    // A pending lookup is a lookup, not a hit.
    let stats = cache.stats();
    assert_eq!(stats.lookups, 2);
    assert_eq!(stats.hits, 0);

    // Busy completes on the last release without further calls.
    drop(holder);
    assert!(cache.is_empty());
    assert!(cache.lookup_status(&"A").unwrap().is_none());
    assert_eq!(cache.stats().deletes, 1);
    cache.check_invariants().unwrap();
}

#[test]
fn test_busy_force_delete_returns_callers_pin() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let cache = make_cache(4, 4);
    let mine = cache
        .insert("A", 7, Arc::new(Tracked(Arc::clone(&cleaned))))
        .unwrap();
    let a = cache.lookup(&"A").unwrap();
    let b = cache.lookup(&"A").unwrap();
    assert_eq!(b.pin_count(), 3);

    assert_eq!(cache.force_delete(mine, false), Err(CacheError::Busy));
    assert_eq!(b.pin_count(), 2);

    drop(a);
    assert_eq!(cleaned.load(Ordering::SeqCst), 0);
    assert_eq!(*b, 7);
    drop(b);
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
}

#[test]
fn test_release_moves_entry_to_mru() {
    let cache = make_cache(3, 4);
    for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
        drop(cache.insert_default(key, i).unwrap());
    }

    // Touch "a" so that "b" becomes the least recently released.
    drop(cache.lookup(&"a").unwrap());
    drop(cache.insert_default("d", 3).unwrap());
    assert!(cache.lookup(&"b").is_none());

    // Now "c" is the oldest.
    drop(cache.insert_default("e", 4).unwrap());
    assert!(cache.lookup(&"c").is_none());
    assert!(cache.lookup(&"a").is_some());
    cache.check_invariants().unwrap();
}

#[test]
fn test_counters_and_metrics() {
    let cache = make_cache(2, 2);
    drop(cache.insert_default("x", 1u8).unwrap());
    drop(cache.lookup(&"x"));
    drop(cache.lookup(&"y"));
    let hit = cache.lookup(&"x").unwrap();
    cache.force_delete(hit, true).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.lookups, 3);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses(), 2);
    assert_eq!(stats.insert_ok, 1);
    assert_eq!(stats.deletes, 1);
    assert_eq!(stats.size, 0);

    let metrics = cache.metrics();
    assert_eq!(metrics.get("deletes"), Some(&1.0));
    assert_eq!(metrics.get("utilization"), Some(&0.0));
}

#[test]
fn test_destroy_runs_every_cleanup_once() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let cache = make_cache(8, 4);
    for key in ["a", "b", "c", "d", "e"] {
        drop(
            cache
                .insert(key, 0, Arc::new(Tracked(Arc::clone(&cleaned))))
                .unwrap(),
        );
    }
    // Replacement and deletion clean up as they go.
    drop(
        cache
            .insert("a", 1, Arc::new(Tracked(Arc::clone(&cleaned))))
            .unwrap(),
    );
    let b = cache.lookup(&"b").unwrap();
    cache.force_delete(b, false).unwrap();
    assert_eq!(cleaned.load(Ordering::SeqCst), 2);

    cache.destroy();
    assert_eq!(cleaned.load(Ordering::SeqCst), 6);
}

#[test]
fn test_failed_insert_skips_cleanup() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let cache = make_cache(1, 1);
    let pinned = cache
        .insert("a", 1, Arc::new(Tracked(Arc::clone(&cleaned))))
        .unwrap();

    let err = cache
        .insert("b", 2, Arc::new(Tracked(Arc::clone(&cleaned))))
        .unwrap_err();
    assert_eq!(err, CacheError::CacheFull);
    assert_eq!(cleaned.load(Ordering::SeqCst), 0);

    drop(pinned);
    drop(cache);
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dump_format() {
    let cache = make_cache(4, 2);
    let a = cache.insert_default("a", "alpha").unwrap();
    drop(cache.insert_default("b", "beta").unwrap());
    drop(cache.lookup(&"b"));
    let deleter = a.repin().unwrap();
    let _ = cache.force_delete(deleter, false);

    let mut out = String::new();
    cache.dump("strings", &mut out).unwrap();
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "Cache strings");
    assert_eq!(lines[1], "hit ratio: 1/1 = 1.00");
    assert_eq!(lines[2], "size: 2/4");
    assert_eq!(lines[3], "hash table size: 2");
    assert!(lines[4].starts_with("mru: 0x"));
    // Header plus one row per entry.
    assert_eq!(lines.len(), 8);
    assert!(out.contains("\"alpha\""));
    assert!(out.contains("\"beta\""));
    drop(a);
}
