//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::persistence::SnapshotCodec;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// TTL for entries written without an explicit TTL
    pub default_ttl: Duration,
    /// Expiry sweep interval
    pub cleanup_interval: Duration,
    /// Advisory memory budget in bytes
    pub max_memory_usage: usize,
    /// Directory holding the snapshot file
    pub persistence_path: PathBuf,
    /// Snapshot write interval
    pub persistence_interval: Duration,
    /// Toggles the whole persistence subsystem
    pub enable_persistence: bool,
    /// Snapshots older than this are ignored at startup
    pub snapshot_max_age: Duration,
    /// Entries serializing to this many bytes or more are not persisted
    pub max_persisted_entry_size: usize,
    /// Aggregate byte budget for one snapshot
    pub max_snapshot_size: usize,
    /// Snapshot compression
    pub snapshot_compression: SnapshotCodec,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_SECS` - Default TTL in seconds (default: 300)
    /// - `CACHE_CLEANUP_INTERVAL_SECS` - Expiry sweep interval (default: 60)
    /// - `CACHE_MAX_MEMORY_BYTES` - Advisory memory budget (default: 100 MiB)
    /// - `CACHE_PERSISTENCE_PATH` - Snapshot directory (default: ./cache)
    /// - `CACHE_PERSISTENCE_INTERVAL_SECS` - Snapshot interval (default: 300)
    /// - `CACHE_ENABLE_PERSISTENCE` - `true`/`false` (default: true)
    /// - `CACHE_SNAPSHOT_MAX_AGE_SECS` - Max snapshot age on load (default: 3600)
    /// - `CACHE_MAX_PERSISTED_ENTRY_BYTES` - Per-entry ceiling (default: 1 MiB)
    /// - `CACHE_MAX_SNAPSHOT_BYTES` - Whole-snapshot budget (default: 64 MiB)
    /// - `CACHE_SNAPSHOT_COMPRESSION` - `none` or `gzip` (default: none)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unparseable values fall back to the default. Timer intervals are at
    /// least one second.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_size: parse_env("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            default_ttl: secs_env("CACHE_DEFAULT_TTL_SECS").unwrap_or(defaults.default_ttl),
            cleanup_interval: secs_env("CACHE_CLEANUP_INTERVAL_SECS")
                .map(at_least_one_second)
                .unwrap_or(defaults.cleanup_interval),
            max_memory_usage: parse_env("CACHE_MAX_MEMORY_BYTES")
                .unwrap_or(defaults.max_memory_usage),
            persistence_path: env::var("CACHE_PERSISTENCE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.persistence_path),
            persistence_interval: secs_env("CACHE_PERSISTENCE_INTERVAL_SECS")
                .map(at_least_one_second)
                .unwrap_or(defaults.persistence_interval),
            enable_persistence: parse_env("CACHE_ENABLE_PERSISTENCE")
                .unwrap_or(defaults.enable_persistence),
            snapshot_max_age: secs_env("CACHE_SNAPSHOT_MAX_AGE_SECS")
                .unwrap_or(defaults.snapshot_max_age),
            max_persisted_entry_size: parse_env("CACHE_MAX_PERSISTED_ENTRY_BYTES")
                .unwrap_or(defaults.max_persisted_entry_size),
            max_snapshot_size: parse_env("CACHE_MAX_SNAPSHOT_BYTES")
                .unwrap_or(defaults.max_snapshot_size),
            snapshot_compression: parse_env("CACHE_SNAPSHOT_COMPRESSION")
                .unwrap_or(defaults.snapshot_compression),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Duration::from_secs(5 * 60),
            cleanup_interval: Duration::from_secs(60),
            max_memory_usage: 100 * 1024 * 1024,
            persistence_path: PathBuf::from("./cache"),
            persistence_interval: Duration::from_secs(5 * 60),
            enable_persistence: true,
            snapshot_max_age: Duration::from_secs(60 * 60),
            max_persisted_entry_size: 1024 * 1024,
            max_snapshot_size: 64 * 1024 * 1024,
            snapshot_compression: SnapshotCodec::Plain,
            server_port: 3000,
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn secs_env(name: &str) -> Option<Duration> {
    parse_env::<u64>(name).map(Duration::from_secs)
}

fn at_least_one_second(interval: Duration) -> Duration {
    interval.max(Duration::from_secs(1))
}
