//! Pinned LRU Cache Implementation
//!
//! A [`Cache`] maps keys to shared data through a fixed-size array of hash
//! buckets. Callers never get plain references out of the cache: every
//! successful [`insert`](Cache::insert) or [`lookup`](Cache::lookup) returns a
//! [`Pinned`] guard, and an entry is only freed once no guard refers to it.
//!
//! # Algorithm
//!
//! Each entry carries a pin count. Entries with no pins sit on an MRU/LRU
//! list; pinning an entry takes it off the list and the last release puts it
//! back at the MRU head. Eviction therefore only ever considers unpinned
//! entries, taken from the LRU tail.
//!
//! Deleting an entry that other threads still pin cannot free it. Instead the
//! entry is marked *delete-pending*: lookups stop finding it and whichever
//! release drops the last pin finalizes it.
//!
//! ```text
//!   buckets                          MRU/LRU list (pin_count == 0 only)
//!   ┌───┐
//!   │ 0 │──▶ [A pins=0] [C pins=2]   head ──▶ [A] ◀──▶ [D] ◀── tail
//!   │ 1 │                                                    (victim)
//!   │ 2 │──▶ [D pins=0]
//!   │ 3 │──▶ [B pins=1, pending]
//!   └───┘
//! ```
//!
//! # Locking
//!
//! One mutex per cache protects the buckets, the list, the counters and the
//! pin count and delete flag of every entry. Keys, data and entry policies
//! are immutable once inserted and are read through a guard without locking.
//! The registry lock is always taken before a cache lock.
//!
//! Entry cleanup callbacks run after the cache lock has been released.
//!
//! # Examples
//!
//! ```
//! use pincache::{Cache, CacheConfig, CacheError};
//!
//! let cache: Cache<&str, u32> = Cache::new(CacheConfig::new(2, 4).unwrap()).unwrap();
//!
//! let a = cache.insert_default("a", 1).unwrap();
//! let b = cache.insert_default("b", 2).unwrap();
//!
//! // Both entries are pinned, nothing can be evicted.
//! assert_eq!(cache.insert_default("c", 3).unwrap_err(), CacheError::CacheFull);
//!
//! cache.release(a);
//! let c = cache.insert_default("c", 3).unwrap();
//! assert!(cache.lookup(&"a").is_none());
//! assert_eq!(*c, 3);
//! # drop((b, c));
//! ```

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, Link};
use crate::error::CacheError;
use crate::list::List;
use crate::metrics::{CacheMetrics, CacheStats};
use crate::policy::{CachePolicy, CacheView, DefaultEntryPolicy, EntryPolicy, HashPolicy};
use crate::registry::{self, RegisteredCache};
use core::fmt;
use core::hash::Hash;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU64, Ordering};
use log::{debug, error, trace, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

type EntryPtr<K, V> = NonNull<CacheEntry<K, V>>;
type Retired<K, V> = Vec<Box<CacheEntry<K, V>>>;

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// Outcome of scanning a bucket for a key.
enum Probe<K, V> {
    Missing,
    Pending,
    Found(EntryPtr<K, V>),
}

/// Everything guarded by the cache mutex.
struct CacheState<K, V> {
    stats: CacheStats,
    /// Size slots taken by inserts that have not yet chained their entry.
    reserved: usize,
    buckets: Box<[Vec<EntryPtr<K, V>>]>,
    lru: List<K, V>,
}

// SAFETY: the raw entry pointers are owned by the state and only followed by
// the thread holding the mutex around it.
unsafe impl<K: Send + Sync, V: Send + Sync> Send for CacheState<K, V> {}

impl<K, V> CacheState<K, V> {
    fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let buckets = config.hash_size.get();
        let mut table: Vec<Vec<EntryPtr<K, V>>> = Vec::new();
        if table.try_reserve_exact(buckets).is_err() {
            error!("insufficient memory to create hash table of {buckets} buckets");
            return Err(CacheError::OutOfMemory { buckets });
        }
        table.resize_with(buckets, Vec::new);

        Ok(CacheState {
            stats: CacheStats::new(config.max_size.get(), buckets),
            reserved: 0,
            buckets: table.into_boxed_slice(),
            lru: List::new(),
        })
    }

    /// Finds the entry for `key` in `bucket`, comparing with each entry's
    /// own policy.
    fn find(&self, bucket: usize, key: &K) -> Probe<K, V> {
        for &node in self.buckets[bucket].iter() {
            // SAFETY: chained entries are live and the lock is held.
            unsafe {
                let entry = node.as_ref();
                if entry.policy().key_eq(key, entry.key()) {
                    return if (*entry.state()).delete_pending {
                        Probe::Pending
                    } else {
                        Probe::Found(node)
                    };
                }
            }
        }
        Probe::Missing
    }

    /// Adds a pin, unlinking the entry from the list if it had none.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache.
    unsafe fn pin(&mut self, node: EntryPtr<K, V>) {
        unsafe {
            let state = node.as_ref().state();
            if (*state).pin_count == 0 {
                self.lru.detach(node);
            }
            (*state).pin_count += 1;
        }
    }

    /// Gives back a pin taken by a delete that came back busy.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache with `pin_count > 1`.
    unsafe fn undo_pin(&mut self, node: EntryPtr<K, V>) {
        unsafe { (*node.as_ref().state()).pin_count -= 1 };
    }

    /// Drops one pin.
    ///
    /// Returns the entry when this was the last pin of a pending delete; the
    /// caller retires it once the lock is released.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache with `pin_count >= 1`.
    unsafe fn unpin(&mut self, node: EntryPtr<K, V>) -> Option<Box<CacheEntry<K, V>>> {
        unsafe {
            let state = node.as_ref().state();
            match (*state).pin_count {
                1 if (*state).delete_pending => Some(self.finalize(node)),
                1 => {
                    (*state).pin_count = 0;
                    self.lru.attach(node);
                    None
                }
                _ => {
                    (*state).pin_count -= 1;
                    None
                }
            }
        }
    }

    /// Marks the entry delete-pending and finalizes it if the caller's pin is
    /// the only one.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache with `pin_count >= 1`.
    unsafe fn delete(
        &mut self,
        node: EntryPtr<K, V>,
        uncount_hit: bool,
    ) -> Result<Box<CacheEntry<K, V>>, CacheError> {
        unsafe {
            let state = node.as_ref().state();
            (*state).delete_pending = true;
            if uncount_hit {
                self.stats.uncount_hit();
            }
            if (*state).pin_count > 1 {
                return Err(CacheError::Busy);
            }
            Ok(self.finalize(node))
        }
    }

    /// Unchains a pinned entry and takes back ownership of its allocation.
    ///
    /// # Safety
    ///
    /// `node` must be a chained, pinned entry of this cache.
    unsafe fn finalize(&mut self, node: EntryPtr<K, V>) -> Box<CacheEntry<K, V>> {
        let bucket = unsafe { node.as_ref().bucket() };
        let chain = &mut self.buckets[bucket];
        let pos = chain.iter().position(|&chained| chained == node);
        debug_assert!(pos.is_some(), "finalized entry missing from bucket {bucket}");
        if let Some(pos) = pos {
            chain.remove(pos);
        }
        self.stats.record_delete();
        // SAFETY: the entry was leaked from a Box by `insert` and is now
        // unreachable from the table.
        unsafe { Box::from_raw(node.as_ptr()) }
    }

    /// Makes room for one more entry and counts it in `size`.
    ///
    /// Evicts the LRU tail when the cache is at capacity.
    fn reserve(&mut self) -> Result<Option<Box<CacheEntry<K, V>>>, CacheError> {
        let mut evicted = None;
        if self.stats.size >= self.stats.max_size {
            let victim = self.lru.tail().ok_or(CacheError::CacheFull)?;
            // SAFETY: list members are live entries of this cache.
            unsafe {
                self.pin(victim);
                match self.delete(victim, false) {
                    Ok(entry) => evicted = Some(entry),
                    Err(err) => {
                        self.undo_pin(victim);
                        return Err(err);
                    }
                }
            }
        }
        self.stats.size += 1;
        self.reserved += 1;
        Ok(evicted)
    }

    /// Returns a slot taken by [`reserve`](Self::reserve) without using it.
    fn unreserve(&mut self) {
        self.stats.size -= 1;
        self.reserved -= 1;
    }

    /// Pins and deletes LRU victims until the list is empty.
    fn drain(&mut self) -> Retired<K, V> {
        let mut retired = Vec::with_capacity(self.lru.len());
        while let Some(victim) = self.lru.tail() {
            // SAFETY: list members are live entries of this cache.
            unsafe {
                self.pin(victim);
                match self.delete(victim, false) {
                    Ok(entry) => retired.push(entry),
                    Err(err) => {
                        warn!("failed to drain cache entry: {err}");
                        self.undo_pin(victim);
                        break;
                    }
                }
            }
        }
        retired
    }

    fn check_invariants(&self) -> Result<(), CacheError> {
        let violation = |msg: String| Err(CacheError::InvariantViolation(msg));

        let mut chained = 0;
        let mut unpinned = 0;
        for (index, chain) in self.buckets.iter().enumerate() {
            for &node in chain {
                chained += 1;
                // SAFETY: chained entries are live and the lock is held.
                let (bucket, pins, pending) = unsafe {
                    let entry = node.as_ref();
                    let state = &*entry.state();
                    (entry.bucket(), state.pin_count, state.delete_pending)
                };
                if bucket != index {
                    return violation(format!("entry in bucket {index} hashed to {bucket}"));
                }
                if pending && pins == 0 {
                    return violation(format!("unpinned entry pending delete in bucket {index}"));
                }
                if pins == 0 {
                    unpinned += 1;
                }
            }
        }

        // SAFETY: the lock is held for the whole iteration.
        for node in unsafe { self.lru.iter() } {
            let pins = unsafe { (*node.as_ref().state()).pin_count };
            if pins != 0 {
                return violation(format!("listed entry holds {pins} pins"));
            }
        }

        if self.lru.len() != unpinned {
            return violation(format!(
                "{} listed entries but {unpinned} unpinned entries",
                self.lru.len()
            ));
        }
        if self.stats.size != chained + self.reserved {
            return violation(format!(
                "size {} but {chained} chained and {} reserved",
                self.stats.size, self.reserved
            ));
        }
        if self.stats.size > self.stats.max_size {
            return violation(format!(
                "size {} exceeds max_size {}",
                self.stats.size, self.stats.max_size
            ));
        }
        Ok(())
    }

    fn dump(&self, name: &str, out: &mut dyn fmt::Write) -> fmt::Result {
        let stats = &self.stats;
        writeln!(out, "Cache {name}")?;
        writeln!(
            out,
            "hit ratio: {}/{} = {:.2}",
            stats.hits,
            stats.lookups,
            stats.hit_rate()
        )?;
        writeln!(out, "size: {}/{}", stats.size, stats.max_size)?;
        writeln!(out, "hash table size: {}", stats.hash_size)?;
        writeln!(
            out,
            "mru: {}, lru: {}",
            link_addr(self.lru.head()),
            link_addr(self.lru.tail())
        )?;
        writeln!(out, "bucket  entry  pins  pending  prev  next  data")?;

        for (index, chain) in self.buckets.iter().enumerate() {
            for &node in chain {
                // SAFETY: chained entries are live and the lock is held.
                let entry = unsafe { node.as_ref() };
                let state = unsafe { &*entry.state() };
                write!(
                    out,
                    "{index}  {:p}  {}  {}  {}  {}  ",
                    node.as_ptr(),
                    state.pin_count,
                    u8::from(state.delete_pending),
                    link_addr(state.prev),
                    link_addr(state.next),
                )?;
                entry.policy().print(entry.data(), out)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

fn link_addr<K, V>(link: Link<K, V>) -> String {
    match link {
        Some(node) => format!("{:p}", node.as_ptr()),
        None => "-".to_string(),
    }
}

fn retire_all<K, V>(retired: impl IntoIterator<Item = Box<CacheEntry<K, V>>>) {
    for entry in retired {
        entry.retire();
    }
}

/// State shared between a [`Cache`] handle and the registry.
struct CacheShared<K, V> {
    id: u64,
    config: CacheConfig,
    policy: Box<dyn CachePolicy<K>>,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> CacheShared<K, V> {
    #[inline]
    fn bucket_of(&self, key: &K) -> usize {
        let hash_size = self.config.hash_size.get();
        self.policy.hash(hash_size, key) % hash_size
    }

    /// Drops one pin and retires the entry if that completed a delete.
    fn release(&self, node: EntryPtr<K, V>) {
        let finalized = {
            let mut state = self.state.lock();
            // SAFETY: `node` comes from a live guard, which holds a pin.
            unsafe { state.unpin(node) }
        };
        if let Some(entry) = finalized {
            trace!("cache {}: finalized deferred delete", self.id);
            entry.retire();
        }
    }
}

impl<K, V> CacheView for CacheShared<K, V> {
    fn id(&self) -> u64 {
        self.id
    }

    fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    fn dump(&self, name: &str, out: &mut dyn fmt::Write) -> fmt::Result {
        self.state.lock().dump(name, out)
    }
}

impl<K, V> RegisteredCache for CacheShared<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.policy.debug(self, out)
    }
}

/// A thread-safe cache of pinned entries with LRU eviction.
///
/// Share it between threads by reference (scoped threads) or inside an
/// `Arc`. Dropping the cache destroys it: remaining entries are cleaned up
/// and the cache leaves the [registry](crate::registry). Guards borrow the
/// cache, so none can outlive it.
pub struct Cache<K, V> {
    shared: Arc<CacheShared<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a cache and registers it.
    ///
    /// Fails with [`CacheError::OutOfMemory`] when the bucket array cannot be
    /// allocated.
    pub fn create(
        config: CacheConfig,
        policy: impl CachePolicy<K> + 'static,
    ) -> Result<Self, CacheError> {
        let state = CacheState::new(&config)?;
        let shared = Arc::new(CacheShared {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            policy: Box::new(policy),
            state: Mutex::new(state),
        });
        registry::register(Arc::clone(&shared) as Arc<dyn RegisteredCache>);
        debug!(
            "created cache {} (max_size {}, hash_size {})",
            shared.id, config.max_size, config.hash_size
        );
        Ok(Cache { shared })
    }

    /// Inserts `data` under `key` and returns it pinned.
    ///
    /// At capacity the least recently released entry is evicted. An existing
    /// entry for `key` is replaced, provided nobody else pins it.
    ///
    /// # Errors
    ///
    /// - [`CacheError::CacheFull`] when at capacity and every entry is pinned.
    /// - [`CacheError::Busy`] when the existing entry for `key` is pinned by
    ///   another holder. That entry is now delete-pending.
    /// - [`CacheError::DeletePending`] when the existing entry for `key` is
    ///   already being retired.
    ///
    /// On error `data` is dropped without going through the entry policy.
    pub fn insert(
        &self,
        key: K,
        data: V,
        policy: Arc<dyn EntryPolicy<K, V>>,
    ) -> Result<Pinned<'_, K, V>, CacheError> {
        let shared = &*self.shared;
        let mut retired: Retired<K, V> = Vec::new();

        {
            let mut state = shared.state.lock();
            match state.reserve() {
                Ok(evicted) => retired.extend(evicted),
                Err(err) => {
                    state.stats.record_insert_fail();
                    return Err(err);
                }
            }
        }
        if !retired.is_empty() {
            trace!("cache {}: evicted LRU entry", shared.id);
        }

        let bucket = shared.bucket_of(&key);
        let node = Box::new(CacheEntry::new(key, data, policy, bucket));

        let result = {
            let mut state = shared.state.lock();
            let outcome = match state.find(bucket, node.key()) {
                Probe::Missing => Ok(()),
                Probe::Pending => Err(CacheError::DeletePending),
                // SAFETY: `find` only returns live entries of this cache.
                Probe::Found(old) => unsafe {
                    state.pin(old);
                    match state.delete(old, false) {
                        Ok(entry) => {
                            retired.push(entry);
                            Ok(())
                        }
                        Err(err) => {
                            state.undo_pin(old);
                            Err(err)
                        }
                    }
                },
            };

            match outcome {
                Ok(()) => {
                    let ptr = NonNull::from(Box::leak(node));
                    state.buckets[bucket].insert(0, ptr);
                    state.reserved -= 1;
                    state.stats.record_insert_ok();
                    Ok(ptr)
                }
                Err(err) => {
                    state.unreserve();
                    state.stats.record_insert_fail();
                    Err(err)
                }
            }
        };

        retire_all(retired);
        match result {
            Ok(ptr) => Ok(Pinned::new(shared, ptr)),
            Err(err) => {
                debug!("cache {}: insert failed: {err}", shared.id);
                Err(err)
            }
        }
    }

    /// Inserts with the [`DefaultEntryPolicy`].
    pub fn insert_default(&self, key: K, data: V) -> Result<Pinned<'_, K, V>, CacheError>
    where
        K: Eq,
        V: fmt::Debug,
    {
        self.insert(key, data, Arc::new(DefaultEntryPolicy))
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a cache hashing keys with the default [`HashPolicy`].
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        Self::create(config, HashPolicy::new())
    }
}

impl<K, V> Cache<K, V> {
    /// Looks up `key` and returns its entry pinned.
    ///
    /// Entries pending deletion are treated as misses.
    pub fn lookup(&self, key: &K) -> Option<Pinned<'_, K, V>> {
        self.lookup_status(key).ok().flatten()
    }

    /// Like [`lookup`](Self::lookup), but reports a match on an entry pending
    /// deletion as [`CacheError::DeletePending`] instead of `Ok(None)`.
    pub fn lookup_status(&self, key: &K) -> Result<Option<Pinned<'_, K, V>>, CacheError> {
        let shared = &*self.shared;
        let bucket = shared.bucket_of(key);

        let mut state = shared.state.lock();
        state.stats.record_lookup();
        match state.find(bucket, key) {
            Probe::Missing => Ok(None),
            Probe::Pending => Err(CacheError::DeletePending),
            Probe::Found(node) => {
                state.stats.record_hit();
                // SAFETY: `find` only returns live entries of this cache.
                unsafe { state.pin(node) };
                Ok(Some(Pinned::new(shared, node)))
            }
        }
    }

    /// Releases a pin. Same as dropping the guard.
    pub fn release(&self, pinned: Pinned<'_, K, V>) {
        debug_assert!(core::ptr::eq(pinned.cache, &*self.shared));
        drop(pinned);
    }

    /// Deletes the guard's entry.
    ///
    /// The guard's pin is consumed either way. With `uncount_hit` the lookup
    /// that produced the guard no longer counts as a hit.
    ///
    /// # Errors
    ///
    /// [`CacheError::Busy`] when other guards still pin the entry. The entry
    /// is already hidden from lookups and the last of those guards to be
    /// released finalizes it.
    pub fn force_delete(&self, pinned: Pinned<'_, K, V>, uncount_hit: bool) -> Result<(), CacheError> {
        debug_assert!(core::ptr::eq(pinned.cache, &*self.shared));
        let pinned = ManuallyDrop::new(pinned);
        let shared = pinned.cache;
        let node = pinned.entry;

        let mut state = shared.state.lock();
        // SAFETY: the guard holds a pin on a live entry.
        match unsafe { state.delete(node, uncount_hit) } {
            Ok(entry) => {
                drop(state);
                trace!("cache {}: deleted entry", shared.id);
                entry.retire();
                Ok(())
            }
            Err(err) => {
                // SAFETY: busy means another pin remains besides ours.
                unsafe { state.undo_pin(node) };
                drop(state);
                debug!("cache {}: delete deferred to last release", shared.id);
                Err(err)
            }
        }
    }

    /// Number of pins on the guard's entry, its own included.
    pub fn pin_count(&self, pinned: &Pinned<'_, K, V>) -> usize {
        pinned.pin_count()
    }

    /// Process-unique identifier, as listed by [`registry::ids`].
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// The configuration the cache was created with.
    pub fn config(&self) -> CacheConfig {
        self.shared.config
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.shared.state.lock().stats
    }

    /// Number of entries in the hash table.
    pub fn len(&self) -> usize {
        self.shared.state.lock().stats.size
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes a text dump of the counters and every entry to `out`.
    ///
    /// Entry data is printed by each entry's policy, with the cache lock
    /// held.
    pub fn dump(&self, name: &str, out: &mut dyn fmt::Write) -> fmt::Result {
        self.shared.dump(name, out)
    }

    /// Verifies the structural invariants of the table and the list.
    pub fn check_invariants(&self) -> Result<(), CacheError> {
        self.shared.state.lock().check_invariants()
    }

    /// Destroys the cache. Same as dropping it.
    pub fn destroy(self) {
        drop(self);
    }
}

impl<K, V> Drop for Cache<K, V> {
    fn drop(&mut self) {
        let shared = &*self.shared;
        let retired = registry::with_locked(|caches| {
            let mut state = shared.state.lock();
            let retired = state.drain();
            if state.stats.size != 0 {
                warn!(
                    "cache {}: {} entries left after drain",
                    shared.id, state.stats.size
                );
            }
            state.buckets = Box::default();
            if !caches.unregister(shared.id) {
                warn!("cache {} missing from the registry at destroy", shared.id);
            }
            retired
        });
        let count = retired.len();
        retire_all(retired);
        debug!("destroyed cache {} ({count} entries released)", shared.id);
    }
}

impl<K, V> CacheMetrics for Cache<K, V> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.stats().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "PinnedLRU"
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// A pinned cache entry.
///
/// While the guard lives the entry's key and data stay valid, even if the
/// entry is deleted or evicted from the table in the meantime. Dropping the
/// guard releases the pin.
pub struct Pinned<'c, K, V> {
    cache: &'c CacheShared<K, V>,
    entry: EntryPtr<K, V>,
}

// SAFETY: the guard only hands out shared references to the immutable key and
// data, and releases through the cache mutex.
unsafe impl<K: Send + Sync, V: Send + Sync> Send for Pinned<'_, K, V> {}
// SAFETY: see above.
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for Pinned<'_, K, V> {}

impl<'c, K, V> Pinned<'c, K, V> {
    fn new(cache: &'c CacheShared<K, V>, entry: EntryPtr<K, V>) -> Self {
        Pinned { cache, entry }
    }

    #[inline]
    fn entry(&self) -> &CacheEntry<K, V> {
        // SAFETY: the pin keeps the entry allocated.
        unsafe { self.entry.as_ref() }
    }

    /// The entry's key.
    pub fn key(&self) -> &K {
        self.entry().key()
    }

    /// The entry's data.
    pub fn data(&self) -> &V {
        self.entry().data()
    }

    /// Returns `false` once the entry has been marked for deletion.
    pub fn is_valid(&self) -> bool {
        let _state = self.cache.state.lock();
        // SAFETY: the lock is held.
        unsafe { !(*self.entry().state()).delete_pending }
    }

    /// Number of pins on the entry, this one included.
    pub fn pin_count(&self) -> usize {
        let _state = self.cache.state.lock();
        // SAFETY: the lock is held.
        unsafe { (*self.entry().state()).pin_count }
    }

    /// Takes an additional pin on the same entry.
    ///
    /// Returns `None` once the entry is pending deletion.
    pub fn repin(&self) -> Option<Pinned<'c, K, V>> {
        let mut state = self.cache.state.lock();
        // SAFETY: our own pin keeps the entry live and off the list.
        unsafe {
            if (*self.entry().state()).delete_pending {
                return None;
            }
            state.pin(self.entry);
        }
        Some(Pinned::new(self.cache, self.entry))
    }
}

impl<K, V> Deref for Pinned<'_, K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.data()
    }
}

impl<K, V> Drop for Pinned<'_, K, V> {
    fn drop(&mut self) {
        self.cache.release(self.entry);
    }
}

impl<K, V> fmt::Debug for Pinned<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pinned")
            .field("cache", &self.cache.id)
            .field("entry", &self.entry)
            .finish()
    }
}
