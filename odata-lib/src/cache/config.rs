//! Cache configuration

use std::time::Duration;

/// Configuration for how long loaded schemas stay cached.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use odata_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default().with_metadata_ttl(Duration::from_secs(7200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for loaded service schemas.
    ///
    /// Default: 1 hour
    pub metadata_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            metadata_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metadata TTL.
    pub fn with_metadata_ttl(mut self, ttl: Duration) -> Self {
        self.metadata_ttl = ttl;
        self
    }

    /// Creates a config that never keeps cached schemas.
    pub fn no_cache() -> Self {
        Self {
            metadata_ttl: Duration::ZERO,
        }
    }

    /// Returns `true` if cached values would expire immediately.
    pub fn is_disabled(&self) -> bool {
        self.metadata_ttl.is_zero()
    }
}
