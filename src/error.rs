//! Error types for the pinned cache.
//!
//! Every fallible cache operation returns [`CacheError`]. None of the variants
//! are fatal: the engine never leaves provisional state behind when it returns
//! an error, so callers are free to carry on uncached.
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | `OutOfMemory` | `create` | the bucket array could not be allocated |
//! | `CacheFull` | `insert` | capacity reached and every entry is pinned |
//! | `Busy` | `insert`, `force_delete` | another holder still pins the entry; the delete completes on its release |
//! | `DeletePending` | `lookup_status`, `insert` | the key's entry is being retired |
//! | `InvalidConfig` | `CacheConfig::new` | zero capacity or zero buckets |
//! | `InvariantViolation` | `check_invariants` | internal bookkeeping is inconsistent |

use thiserror::Error;

/// Errors returned by cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Allocation of the hash table failed.
    #[error("insufficient memory to create a hash table of {buckets} buckets")]
    OutOfMemory {
        /// Number of buckets that were requested.
        buckets: usize,
    },

    /// The cache is at capacity and no entry is evictable.
    #[error("cache full: every entry is pinned")]
    CacheFull,

    /// The entry is pinned by another holder.
    ///
    /// The entry has been marked delete-pending and will be finalized by
    /// whichever release drops the last pin.
    #[error("entry busy: delete deferred until the last pin is released")]
    Busy,

    /// The entry for this key is marked for deletion.
    #[error("entry is pending deletion")]
    DeletePending,

    /// A configuration parameter is out of range.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(&'static str),

    /// Internal cache bookkeeping is inconsistent.
    #[error("cache invariant violated: {0}")]
    InvariantViolation(String),
}

impl CacheError {
    /// Returns `true` for errors that only mean "try again later".
    ///
    /// `Busy` and `DeletePending` clear up as soon as the other holders of the
    /// affected entry release their pins.
    pub fn is_transient(&self) -> bool {
        matches!(self, CacheError::Busy | CacheError::DeletePending)
    }
}
