//! Staleness and eviction configuration.

use std::time::Duration;

/// Invalidation policy for a [`crate::QueryClient`].
///
/// Entries older than `stale_time` are treated as absent by the next
/// first-page read, forcing a refetch while the old flattened view
/// keeps being served until the refetch completes. The cache never
/// holds more than `max_entries` entries; least-recently-used ones are
/// evicted first, skipping entries with a fetch in flight.
#[derive(Debug, Clone)]
pub struct QueryClientConfig {
    /// Staleness window for cached entries.
    pub stale_time: Duration,
    /// Finite bound on cached entries.
    pub max_entries: usize,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(300),
            max_entries: 64,
        }
    }
}

impl QueryClientConfig {
    /// Create a config with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staleness window.
    pub fn with_stale_time(mut self, window: Duration) -> Self {
        self.stale_time = window;
        self
    }

    /// Set the entry bound.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = QueryClientConfig::new()
            .with_stale_time(Duration::from_secs(60))
            .with_max_entries(8);

        assert_eq!(config.stale_time, Duration::from_secs(60));
        assert_eq!(config.max_entries, 8);
    }

    #[test]
    fn test_entry_bound_is_never_zero() {
        let config = QueryClientConfig::new().with_max_entries(0);
        assert_eq!(config.max_entries, 1);
    }
}
