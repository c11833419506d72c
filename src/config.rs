//! Cache Configuration Module
//!
//! A cache is sized by two independent numbers:
//!
//! - **`max_size`**: the maximum number of entries the cache admits. Once it is
//!   reached, inserts evict the least recently released entry, or fail with
//!   [`CacheError::CacheFull`] when every entry is pinned.
//! - **`hash_size`**: the number of buckets in the hash table. It does not have
//!   to match `max_size`; the DNS caches of a web server typically use twice
//!   the capacity to keep bucket chains short.
//!
//! # Examples
//!
//! ```
//! use pincache::config::CacheConfig;
//! use core::num::NonZeroUsize;
//!
//! let config = CacheConfig {
//!     max_size: NonZeroUsize::new(1024).unwrap(),
//!     hash_size: NonZeroUsize::new(2048).unwrap(),
//! };
//! assert_eq!(config.max_size.get(), 1024);
//!
//! // Unchecked integers from a configuration file go through `new`.
//! assert!(CacheConfig::new(0, 16).is_err());
//! ```

use crate::error::CacheError;
use core::fmt;
use core::num::NonZeroUsize;

/// Configuration for a [`Cache`](crate::Cache).
///
/// # Fields
///
/// - `max_size`: maximum number of live entries.
/// - `hash_size`: number of hash buckets.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    pub max_size: NonZeroUsize,
    /// Number of buckets in the hash table.
    pub hash_size: NonZeroUsize,
}

impl CacheConfig {
    /// Builds a configuration from plain integers.
    ///
    /// Returns [`CacheError::InvalidConfig`] when either value is zero.
    pub fn new(max_size: usize, hash_size: usize) -> Result<Self, CacheError> {
        let max_size =
            NonZeroUsize::new(max_size).ok_or(CacheError::InvalidConfig("max_size must be > 0"))?;
        let hash_size = NonZeroUsize::new(hash_size)
            .ok_or(CacheError::InvalidConfig("hash_size must be > 0"))?;
        Ok(Self {
            max_size,
            hash_size,
        })
    }

    /// Configuration with `hash_size = 2 * max_size`.
    pub fn with_capacity(max_size: NonZeroUsize) -> Self {
        Self {
            max_size,
            hash_size: max_size.saturating_mul(NonZeroUsize::MIN.saturating_add(1)),
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max_size", &self.max_size)
            .field("hash_size", &self.hash_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = CacheConfig {
            max_size: NonZeroUsize::new(100).unwrap(),
            hash_size: NonZeroUsize::new(37).unwrap(),
        };
        assert_eq!(config.max_size.get(), 100);
        assert_eq!(config.hash_size.get(), 37);
    }

    #[test]
    fn test_config_new_rejects_zero() {
        assert_eq!(
            CacheConfig::new(0, 4),
            Err(CacheError::InvalidConfig("max_size must be > 0"))
        );
        assert_eq!(
            CacheConfig::new(4, 0),
            Err(CacheError::InvalidConfig("hash_size must be > 0"))
        );
        let config = CacheConfig::new(2, 4).unwrap();
        assert_eq!(config.max_size.get(), 2);
        assert_eq!(config.hash_size.get(), 4);
    }

    #[test]
    fn test_with_capacity_doubles_buckets() {
        let config = CacheConfig::with_capacity(NonZeroUsize::new(50).unwrap());
        assert_eq!(config.hash_size.get(), 100);

        let config = CacheConfig::with_capacity(NonZeroUsize::new(usize::MAX).unwrap());
        assert_eq!(config.hash_size.get(), usize::MAX);
    }
}
