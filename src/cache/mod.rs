//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and tag-based
//! invalidation.

mod clock;
mod entry;
mod keys;
mod lru;
mod shared;
mod stats;
mod store;
mod tags;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{current_timestamp_ms, duration_ms, Clock, MockClock, SystemClock};
pub use entry::{CacheEntry, EntryInfo};
pub use keys::{cache_key, TtlPreset};
pub use lru::LruTracker;
pub use shared::Cache;
pub use stats::{CacheStats, StatsCounters};
pub use store::CacheStore;
pub use tags::TagIndex;

// == Public Constants ==
/// Assumed size in bytes of an entry whose serialized size was never measured
pub const ENTRY_SIZE_ESTIMATE: usize = 1024;
