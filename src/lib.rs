#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Overview
//!
//! ```text
//! ┌────────────────────────── Cache<K, V> ───────────────────────────┐
//! │  Mutex ─┬─ buckets: [chain; hash_size]   (lookup by key)         │
//! │         ├─ MRU/LRU list of unpinned entries (eviction order)     │
//! │         └─ counters: size, hits, lookups, insert ok/fail, deletes│
//! │                                                                  │
//! │  CachePolicy<K>          hash(hash_size, key), debug callback    │
//! └──────────────────────────────────────────────────────────────────┘
//!      entry: key │ data │ Arc<dyn EntryPolicy<K, V>> │ pins │ pending
//! ```
//!
//! ## Looking Up Entries
//!
//! ```rust
//! use pincache::{Cache, CacheConfig};
//!
//! let cache: Cache<u32, String> = Cache::new(CacheConfig::new(128, 256).unwrap()).unwrap();
//!
//! let pinned = cache.insert_default(0x7f00_0001, "localhost".to_string()).unwrap();
//! cache.release(pinned);
//!
//! if let Some(host) = cache.lookup(&0x7f00_0001) {
//!     assert_eq!(host.as_str(), "localhost");
//!     // `host` releases its pin when dropped.
//! };
//! ```
//!
//! ## Deleting Shared Entries
//!
//! A delete that races with other readers never frees data under them:
//!
//! ```rust
//! use pincache::{Cache, CacheConfig, CacheError};
//!
//! let cache: Cache<&str, u32> = Cache::new(CacheConfig::new(8, 8).unwrap()).unwrap();
//! let mine = cache.insert_default("key", 1).unwrap();
//! let theirs = cache.lookup(&"key").unwrap();
//!
//! // Another holder still reads the entry: the delete is deferred.
//! assert_eq!(cache.force_delete(mine, false), Err(CacheError::Busy));
//! assert!(cache.lookup(&"key").is_none());
//! assert_eq!(*theirs, 1);
//!
//! // The last release finalizes it.
//! drop(theirs);
//! assert!(cache.is_empty());
//! ```
//!
//! ## Custom Policies
//!
//! Implement [`policy::EntryPolicy`] to compare keys differently, to release
//! external resources on cleanup or to control how dumps print the data.
//! Implement [`policy::CachePolicy`] to control bucket placement and what the
//! cache contributes to [`registry::report`].
//!
//! ## Modules
//!
//! - [`cache`]: the cache engine and the [`Pinned`] guard
//! - [`policy`]: cache and entry policy traits with default implementations
//! - [`config`]: cache sizing
//! - [`registry`]: enumeration of all live caches
//! - [`metrics`]: counters and the [`metrics::CacheMetrics`] report
//! - [`error`]: error type

/// Cache entry node.
///
/// Holds the immutable key, data and entry policy next to the lock-protected
/// pin count, delete flag and list links.
pub(crate) mod entry;

/// Intrusive MRU/LRU list of unpinned entries.
///
/// **Note**: internal infrastructure built on raw pointers; every operation
/// requires the owning cache's lock.
pub(crate) mod list;

/// Cache configuration.
pub mod config;

/// Error type for cache operations.
pub mod error;

/// Cache and entry policies.
///
/// Provides the [`CachePolicy`](policy::CachePolicy) and
/// [`EntryPolicy`](policy::EntryPolicy) traits plus the stock
/// [`HashPolicy`](policy::HashPolicy) and
/// [`DefaultEntryPolicy`](policy::DefaultEntryPolicy).
pub mod policy;

/// Cache metrics.
///
/// Counter snapshots and a deterministic `BTreeMap` report.
pub mod metrics;

/// Pinned LRU cache engine.
pub mod cache;

/// Process-wide registry of live caches.
pub mod registry;

pub use cache::{Cache, Pinned};
pub use config::CacheConfig;
pub use error::CacheError;
pub use metrics::{CacheMetrics, CacheStats};
pub use policy::{CachePolicy, CacheView, DefaultEntryPolicy, EntryPolicy, HashPolicy};
