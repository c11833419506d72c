//! Cache Entry Node
//!
//! A [`CacheEntry`] is the heap node behind every pinned handle. It is split
//! into two halves with different synchronization rules:
//!
//! - **Immutable half**: `key`, `data`, `policy` and `bucket`. Written once when
//!   the node is built and never touched again, so pin holders read them
//!   without taking the cache lock.
//! - **Lock-protected half**: [`EntryState`] (pin count, delete-pending flag,
//!   MRU/LRU links). It lives in an `UnsafeCell` and may only be accessed by
//!   the thread holding the owning cache's mutex.
//!
//! # Memory Layout
//!
//! ```text
//! ┌──────────────────────── CacheEntry<K, V> ─────────────────────────┐
//! │ key: K │ data: V │ policy: Arc<dyn EntryPolicy> │ bucket: usize   │
//! ├───────────────────────────────────────────────────────────────────┤
//! │ UnsafeCell<EntryState>                                            │
//! │   pin_count │ delete_pending │ prev (toward MRU) │ next (toward LRU)│
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use crate::policy::EntryPolicy;
use core::cell::UnsafeCell;
use core::fmt;
use core::ptr::NonNull;
use std::sync::Arc;

/// Nullable pointer to another entry of the same cache.
pub(crate) type Link<K, V> = Option<NonNull<CacheEntry<K, V>>>;

/// Mutable per-entry bookkeeping, guarded by the cache mutex.
pub(crate) struct EntryState<K, V> {
    /// Number of outstanding pins.
    pub(crate) pin_count: usize,
    /// Hidden from lookups; freed when the last pin is dropped.
    pub(crate) delete_pending: bool,
    /// Neighbour closer to the MRU head.
    pub(crate) prev: Link<K, V>,
    /// Neighbour closer to the LRU tail.
    pub(crate) next: Link<K, V>,
}

/// A cached key/data pair together with its entry policy.
pub(crate) struct CacheEntry<K, V> {
    key: K,
    data: V,
    policy: Arc<dyn EntryPolicy<K, V>>,
    bucket: usize,
    state: UnsafeCell<EntryState<K, V>>,
}

// SAFETY: `key`, `data` and `policy` are immutable after construction and are
// shared by reference across pin holders, which requires `K: Sync, V: Sync`.
// `state` is only accessed under the owning cache's mutex.
unsafe impl<K: Send + Sync, V: Send + Sync> Send for CacheEntry<K, V> {}
// SAFETY: see above.
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for CacheEntry<K, V> {}

impl<K, V> CacheEntry<K, V> {
    /// Creates a detached entry holding the inserter's pin.
    pub(crate) fn new(key: K, data: V, policy: Arc<dyn EntryPolicy<K, V>>, bucket: usize) -> Self {
        CacheEntry {
            key,
            data,
            policy,
            bucket,
            state: UnsafeCell::new(EntryState {
                pin_count: 1,
                delete_pending: false,
                prev: None,
                next: None,
            }),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn data(&self) -> &V {
        &self.data
    }

    #[inline]
    pub(crate) fn policy(&self) -> &dyn EntryPolicy<K, V> {
        &*self.policy
    }

    /// Bucket index computed when the entry was built.
    #[inline]
    pub(crate) fn bucket(&self) -> usize {
        self.bucket
    }

    /// Raw pointer to the lock-protected state.
    ///
    /// Dereferencing it is only sound while the owning cache's mutex is held.
    #[inline]
    pub(crate) fn state(&self) -> *mut EntryState<K, V> {
        self.state.get()
    }

    /// Hands `data` to the entry policy's cleanup and drops the rest.
    ///
    /// Must only be called on an entry that has been unlinked from its cache.
    pub(crate) fn retire(self: Box<Self>) {
        let CacheEntry {
            key, data, policy, ..
        } = *self;
        policy.cleanup(data);
        drop(key);
    }
}

impl<K, V> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}
