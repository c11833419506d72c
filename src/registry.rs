//! Process-wide cache registry.
//!
//! Every [`Cache`](crate::Cache) registers itself on creation and leaves the
//! registry when it is destroyed. The registry exists for enumeration and
//! debugging only; cache operations never consult it.
//!
//! The registry mutex is a constant-initialized `static`. Whenever both locks
//! are needed, the registry lock is taken first.

use crate::metrics::CacheStats;
use crate::policy::CacheView;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;

static REGISTRY: Mutex<Registry> = Mutex::new(Registry::new());

/// A cache as seen by the registry.
pub(crate) trait RegisteredCache: CacheView + Send + Sync {
    /// Runs the cache policy's debug callback.
    fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Live caches, in creation order.
pub(crate) struct Registry {
    caches: Vec<Arc<dyn RegisteredCache>>,
}

impl Registry {
    const fn new() -> Self {
        Registry { caches: Vec::new() }
    }

    /// Removes the cache with the given id. Returns `false` if it was not
    /// registered.
    pub(crate) fn unregister(&mut self, id: u64) -> bool {
        match self.caches.iter().position(|cache| cache.id() == id) {
            Some(pos) => {
                self.caches.remove(pos);
                true
            }
            None => false,
        }
    }
}

pub(crate) fn register(cache: Arc<dyn RegisteredCache>) {
    REGISTRY.lock().caches.push(cache);
}

/// Runs `f` with the registry locked.
pub(crate) fn with_locked<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    f(&mut REGISTRY.lock())
}

/// Ids of all live caches, oldest first.
pub fn ids() -> Vec<u64> {
    REGISTRY.lock().caches.iter().map(|cache| cache.id()).collect()
}

/// Number of live caches.
pub fn len() -> usize {
    REGISTRY.lock().caches.len()
}

/// Returns `true` when no cache is alive.
pub fn is_empty() -> bool {
    len() == 0
}

/// Counter snapshots of all live caches, keyed by cache id.
pub fn stats() -> Vec<(u64, CacheStats)> {
    REGISTRY
        .lock()
        .caches
        .iter()
        .map(|cache| (cache.id(), cache.stats()))
        .collect()
}

/// Writes the debug report of every live cache to `out`.
///
/// Each cache contributes whatever its [`CachePolicy::debug`] callback writes;
/// [`HashPolicy::named`] policies dump the whole cache. Writes a single
/// `no caches registered` line when the registry is empty.
///
/// [`CachePolicy::debug`]: crate::policy::CachePolicy::debug
/// [`HashPolicy::named`]: crate::policy::HashPolicy::named
pub fn report(out: &mut dyn fmt::Write) -> fmt::Result {
    let registry = REGISTRY.lock();
    if registry.caches.is_empty() {
        return writeln!(out, "no caches registered");
    }
    for cache in registry.caches.iter() {
        cache.report(out)?;
    }
    Ok(())
}
