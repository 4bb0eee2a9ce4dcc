//! Rental Cache - in-process data cache for a rental-management backend
//!
//! Bounded key/value cache with per-entry TTL, LRU eviction, tag-based bulk
//! invalidation, hit/miss statistics and periodic disk snapshots for warm
//! restarts.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod tasks;

pub use api::AppState;
pub use cache::{cache_key, Cache, CacheStats, CacheStore, TtlPreset};
pub use config::Config;
pub use persistence::{LoadOutcome, SnapshotPersistence};
pub use tasks::BackgroundTasks;
