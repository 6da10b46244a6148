//! Per-instance cache counters.

/// Counters describing what a cache instance has done since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of transport calls issued.
    pub transport_calls: u64,
    /// Number of loads that joined an in-flight call instead of issuing one.
    pub coalesced: u64,
    /// Number of successful commits.
    pub commits: u64,
    /// Number of loads rejected before I/O.
    pub validation_failures: u64,
    /// Number of 4xx failures.
    pub not_found_failures: u64,
    /// Number of 5xx or network failures.
    pub transient_failures: u64,
    /// Number of transient failures that kept the previous items.
    pub rollbacks: u64,
    /// Number of keys evicted due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Total classified failures.
    pub fn failures(&self) -> u64 {
        self.validation_failures + self.not_found_failures + self.transient_failures
    }

    /// Share of loads served by an in-flight call (0.0 to 1.0).
    pub fn coalesce_rate(&self) -> f64 {
        let total = self.transport_calls + self.coalesced;
        if total == 0 {
            0.0
        } else {
            self.coalesced as f64 / total as f64
        }
    }
}
