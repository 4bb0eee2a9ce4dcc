//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and expirations.

use serde::{Deserialize, Serialize};

// == Stats Counters ==
/// Running counters owned by the store.
///
/// Only raw counters live here. Totals and ratios are derived on read so they
/// can never drift from the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCounters {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of live entries removed to make room for a new key
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
}

impl StatsCounters {
    // == Constructor ==
    /// Creates a new counter set with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    pub fn record_hit(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    pub fn record_miss(&mut self) {
        self.misses = self.misses.saturating_add(1);
    }

    pub fn record_eviction(&mut self) {
        self.evictions = self.evictions.saturating_add(1);
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations = self
            .expirations
            .saturating_add(u64::try_from(count).unwrap_or(u64::MAX));
    }

    // == Derived ==
    /// Total number of `get` calls observed.
    pub fn total_requests(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }

    /// Calculates the cache hit rate.
    ///
    /// Returns hits / total_requests, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Merge ==
    /// Adds counters restored from a snapshot onto the running ones.
    ///
    /// Counters saturate at `u64::MAX`; a snapshot can carry any value.
    pub fn absorb(&mut self, other: &StatsCounters) {
        self.hits = self.hits.saturating_add(other.hits);
        self.misses = self.misses.saturating_add(other.misses);
        self.evictions = self.evictions.saturating_add(other.evictions);
        self.expirations = self.expirations.saturating_add(other.expirations);
    }
}

// == Cache Stats ==
/// Immutable point-in-time view returned by `stats()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// hits + misses
    pub total_requests: u64,
    /// hits / total_requests, 0.0 when there were no requests
    pub hit_rate: f64,
    pub evictions: u64,
    pub expirations: u64,
    /// Approximate bytes held by the cache
    pub memory_usage: usize,
    /// Advisory memory budget in bytes
    pub max_memory_usage: Option<usize>,
}

impl CacheStats {
    /// Builds a snapshot from the running counters and current sizing.
    pub fn from_counters(
        counters: &StatsCounters,
        size: usize,
        memory_usage: usize,
        max_memory_usage: Option<usize>,
    ) -> Self {
        Self {
            size,
            hits: counters.hits,
            misses: counters.misses,
            total_requests: counters.total_requests(),
            hit_rate: counters.hit_rate(),
            evictions: counters.evictions,
            expirations: counters.expirations,
            memory_usage,
            max_memory_usage,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let stats = StatsCounters::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.total_requests(), 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = StatsCounters::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut stats = StatsCounters::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = StatsCounters::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
        assert_eq!(stats.total_requests(), 2);
    }

    #[test]
    fn test_absorb() {
        let mut running = StatsCounters::new();
        running.record_hit();

        let restored = StatsCounters {
            hits: 4,
            misses: 2,
            evictions: 1,
            expirations: 3,
        };
        running.absorb(&restored);

        assert_eq!(running.hits, 5);
        assert_eq!(running.misses, 2);
        assert_eq!(running.evictions, 1);
        assert_eq!(running.expirations, 3);
    }

    #[test]
    fn test_snapshot_from_counters() {
        let mut counters = StatsCounters::new();
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();
        counters.record_eviction();
        counters.record_expirations(2);

        let stats = CacheStats::from_counters(&counters, 7, 2048, Some(4096));
        assert_eq!(stats.size, 7);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.hits + stats.misses, stats.total_requests);
        assert!((stats.hit_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.memory_usage, 2048);
        assert_eq!(stats.max_memory_usage, Some(4096));
    }

    #[test]
    fn test_absorb_saturates() {
        let mut counters = StatsCounters::new();
        counters.record_hit();
        counters.absorb(&StatsCounters {
            hits: u64::MAX,
            misses: u64::MAX,
            ..StatsCounters::default()
        });

        assert_eq!(counters.hits, u64::MAX);
        assert_eq!(counters.total_requests(), u64::MAX);
        counters.record_hit();
        assert_eq!(counters.hits, u64::MAX);
    }
}
