//! Per-instance cache configuration.

/// Default number of keys a cache instance keeps before evicting.
pub const DEFAULT_CAPACITY: usize = 50;

/// Configuration for one [`ResourceCache`](crate::ResourceCache) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of keys held after any settled load.
    pub capacity: usize,
    /// Page size used when a load does not specify a limit. `None` fetches
    /// whole partitions.
    pub default_limit: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_limit: None,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the eviction capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the page size applied to loads without an explicit limit.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 50);
        assert_eq!(config.default_limit, None);
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new().with_capacity(8).with_default_limit(20);
        assert_eq!(config.capacity, 8);
        assert_eq!(config.default_limit, Some(20));
    }
}
