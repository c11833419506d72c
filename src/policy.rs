//! Cache and entry policies.
//!
//! The engine never interprets keys or data itself. Everything it needs to
//! know about them comes from two caller-supplied policies:
//!
//! - [`CachePolicy`] is fixed when the cache is created. It maps a key to a
//!   bucket and optionally renders the cache in the registry's debug report.
//! - [`EntryPolicy`] travels with each entry. It compares keys, releases the
//!   entry's data when the entry is finally freed, and prints the data for
//!   diagnostics.
//!
//! Specialized caches (reverse DNS, host lookups, ...) implement both traits
//! over their own key and record types; see [`HashPolicy`] and
//! [`DefaultEntryPolicy`] for the stock implementations.

use crate::metrics::CacheStats;
use core::fmt;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// Read-only view of a registered cache, handed to [`CachePolicy::debug`].
pub trait CacheView {
    /// Process-unique cache identifier.
    fn id(&self) -> u64;

    /// Snapshot of the cache counters.
    fn stats(&self) -> CacheStats;

    /// Renders every entry of the cache under the given heading.
    fn dump(&self, name: &str, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Per-cache policy: bucket hashing and the optional debug callback.
pub trait CachePolicy<K>: Send + Sync {
    /// Maps `key` to a bucket index in `0..hash_size`.
    ///
    /// Values outside that range are reduced modulo `hash_size`.
    fn hash(&self, hash_size: usize, key: &K) -> usize;

    /// Debug callback invoked by [`registry::report`](crate::registry::report).
    ///
    /// Runs with the registry lock held; it must not create or drop caches
    /// or call into [`registry`](crate::registry).
    fn debug(&self, _cache: &dyn CacheView, _out: &mut dyn fmt::Write) -> fmt::Result {
        Ok(())
    }
}

/// Per-entry policy: key comparison, data cleanup and printing.
pub trait EntryPolicy<K, V>: Send + Sync {
    /// Returns `true` if `lookup` designates the entry stored under `stored`.
    fn key_eq(&self, lookup: &K, stored: &K) -> bool;

    /// Releases the entry's data.
    ///
    /// Called exactly once per attached entry, after the entry has become
    /// unreachable and its last pin is gone. Never called for data whose
    /// insert failed.
    ///
    /// Runs without the cache lock held, so it may overlap a re-insert of the
    /// same key that is already visible to other threads.
    fn cleanup(&self, data: V) {
        drop(data);
    }

    /// Prints the data column of a dump row.
    fn print(&self, _data: &V, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("-")
    }
}

/// [`CachePolicy`] that hashes keys with a [`BuildHasher`].
///
/// When given a name, the debug callback dumps the cache under that name.
pub struct HashPolicy<S = DefaultHashBuilder> {
    hash_builder: S,
    name: Option<String>,
}

impl HashPolicy<DefaultHashBuilder> {
    /// Creates an unnamed policy with the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl Default for HashPolicy<DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> HashPolicy<S> {
    /// Creates an unnamed policy with a custom hasher.
    ///
    /// Use this for deterministic bucket placement in tests.
    pub fn with_hasher(hash_builder: S) -> Self {
        HashPolicy {
            hash_builder,
            name: None,
        }
    }

    /// Sets the heading used when the registry report dumps this cache.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Heading used in debug reports, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<K, S> CachePolicy<K> for HashPolicy<S>
where
    K: Hash,
    S: BuildHasher + Send + Sync,
{
    #[inline]
    fn hash(&self, hash_size: usize, key: &K) -> usize {
        (self.hash_builder.hash_one(key) as usize) % hash_size
    }

    fn debug(&self, cache: &dyn CacheView, out: &mut dyn fmt::Write) -> fmt::Result {
        match &self.name {
            Some(name) => cache.dump(name, out),
            None => Ok(()),
        }
    }
}

impl<S> fmt::Debug for HashPolicy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashPolicy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// [`EntryPolicy`] for keys with `Eq` and data with `Debug`.
///
/// Compares keys with `==`, drops data on cleanup and prints it with `{:?}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEntryPolicy;

impl<K, V> EntryPolicy<K, V> for DefaultEntryPolicy
where
    K: Eq,
    V: fmt::Debug,
{
    #[inline]
    fn key_eq(&self, lookup: &K, stored: &K) -> bool {
        lookup == stored
    }

    fn print(&self, data: &V, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{data:?}")
    }
}
