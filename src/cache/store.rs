//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, TTL
//! expiration, tag invalidation and hit/miss accounting.
//!
//! `CacheStore` is not synchronized. Every method that mutates takes `&mut self`
//! so a single lock around the store makes each compound operation atomic; see
//! [`Cache`](crate::cache::Cache) for the shared handle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{
    duration_ms, CacheEntry, CacheStats, Clock, EntryInfo, LruTracker, StatsCounters, SystemClock,
    TagIndex, ENTRY_SIZE_ESTIMATE,
};

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Tag to keys index
    tags: TagIndex,
    /// Performance counters
    stats: StatsCounters,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL in milliseconds for entries written without one
    default_ttl_ms: u64,
    /// Advisory memory budget in bytes
    max_memory_usage: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold (at least 1)
    /// * `default_ttl` - TTL used when `set` is called without one
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            tags: TagIndex::new(),
            stats: StatsCounters::new(),
            max_size: max_size.max(1),
            default_ttl_ms: duration_ms(default_ttl).max(1),
            max_memory_usage: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the advisory memory budget in bytes.
    pub fn with_memory_budget(mut self, max_memory_usage: Option<usize>) -> Self {
        self.max_memory_usage = max_memory_usage;
        self
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn resolve_ttl(&self, ttl: Option<Duration>) -> u64 {
        match ttl.map(duration_ms) {
            Some(ms) if ms > 0 => ms,
            _ => self.default_ttl_ms,
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten and TTL and access
    /// metadata are reset. If the key is new and the cache is at capacity, the
    /// least recently used entry is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None or zero)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let now = self.now_ms();
        let ttl_ms = self.resolve_ttl(ttl);

        self.insert_entry(key.clone(), CacheEntry::new(value, ttl_ms, now), now);
        debug!(key = %key, ttl_ms, "cache entry set");
    }

    /// Stores a key-value pair and registers the key under every tag.
    pub fn set_with_tags<I, S>(
        &mut self,
        key: impl Into<String>,
        value: V,
        tags: I,
        ttl: Option<Duration>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        self.set(key.clone(), value, ttl);
        for tag in tags {
            self.tags.register(tag, &key);
        }
    }

    /// Inserts a prepared entry, evicting first when a new key hits capacity.
    fn insert_entry(&mut self, key: String, entry: CacheEntry<V>, now: u64) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_one(now);
        }
        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }

    /// Removes the least recently used entry.
    fn evict_one(&mut self, now: u64) {
        let Some(victim) = self.lru.evict_oldest() else {
            return;
        };
        if let Some(entry) = self.entries.remove(&victim) {
            if entry.is_expired_at(now) {
                self.stats.record_expirations(1);
                debug!(key = %victim, "expired entry reclaimed at capacity");
            } else {
                self.stats.record_eviction();
                debug!(key = %victim, "cache entry evicted (LRU)");
            }
        }
    }

    /// Drops an entry whose TTL has elapsed.
    fn remove_expired(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.record_expirations(1);
            debug!(key = %key, "cache entry expired");
        }
    }

    // == Has ==
    /// Checks whether a live entry exists for `key`.
    ///
    /// Expired entries are removed, exactly like `get`, but no hit or miss is
    /// recorded and the access order is left alone.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => return false,
        };

        if expired {
            self.remove_expired(key);
        }
        !expired
    }

    // == Expire ==
    /// Gives a live entry a new TTL counted from now.
    ///
    /// Returns false when the key is absent or already expired (an expired
    /// entry is removed on the spot). The value, access metadata and LRU
    /// position are kept, and no hit or miss is recorded. A zero TTL is
    /// treated as one millisecond.
    pub fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        let now = self.now_ms();
        let ttl_ms = duration_ms(ttl).max(1);
        let expired = match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.reset_ttl(ttl_ms, now);
                false
            }
            Some(_) => true,
            None => return false,
        };

        if expired {
            self.remove_expired(key);
            return false;
        }
        debug!(key = %key, ttl_ms, "cache entry ttl updated");
        true
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it was present.
    ///
    /// Tag references to the key are left in place and dropped lazily.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            debug!(key = %key, "cache entry deleted");
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Removes every entry and the whole tag index.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.tags.clear();
        info!(removed, "cache cleared");
    }

    // == Invalidate By Tag ==
    /// Deletes every key registered under `tag`, then forgets the tag.
    ///
    /// Returns the number of entries actually removed. Keys that are already
    /// gone are skipped.
    pub fn invalidate_by_tag(&mut self, tag: &str) -> usize {
        let keys = self.tags.take(tag);
        let registered = keys.len();
        let removed = keys.iter().filter(|key| self.delete(key)).count();

        if registered > 0 {
            debug!(tag = %tag, registered, removed, "cache invalidated by tag");
        }
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_expired(key);
        }

        if !expired_keys.is_empty() {
            debug!(
                expired = expired_keys.len(),
                remaining = self.entries.len(),
                "cache cleanup completed"
            );
        }
        expired_keys.len()
    }

    // == Stats ==
    /// Returns a point-in-time statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats::from_counters(
            &self.stats,
            self.entries.len(),
            self.memory_usage(),
            self.max_memory_usage,
        )
    }

    /// Approximate bytes held, using measured sizes where known.
    pub fn memory_usage(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| key.len() + entry.size_hint.unwrap_or(ENTRY_SIZE_ESTIMATE))
            .sum()
    }

    /// True when the estimate is above the advisory budget.
    pub fn is_over_memory_budget(&self) -> bool {
        self.max_memory_usage
            .is_some_and(|budget| self.memory_usage() > budget)
    }

    // == Introspection ==
    /// Returns all stored keys, sorted. Expired entries not yet reaped are included.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Metadata for one entry, without any expiry side effect.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let now = self.now_ms();
        self.entries.get(key).map(|entry| entry.info(now))
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // == Persistence Hooks ==
    /// Live entries at `now`, mutable so measured sizes can be recorded.
    pub(crate) fn live_entries_mut(
        &mut self,
        now: u64,
    ) -> impl Iterator<Item = (&String, &mut CacheEntry<V>)> {
        self.entries
            .iter_mut()
            .filter(move |(_, entry)| !entry.is_expired_at(now))
    }

    pub(crate) fn counters(&self) -> StatsCounters {
        self.stats
    }

    /// Re-inserts an entry loaded from a snapshot, keeping its metadata.
    pub(crate) fn restore(&mut self, key: String, entry: CacheEntry<V>) {
        let now = self.now_ms();
        self.insert_entry(key, entry, now);
    }

    pub(crate) fn absorb_counters(&mut self, restored: &StatsCounters) {
        self.stats.absorb(restored);
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired, recording a hit and
    /// refreshing the access metadata. Absent and expired keys record a miss;
    /// expired entries are removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_expired(key);
            self.stats.record_miss();
            return None;
        }

        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return None;
        };
        entry.touch(now);
        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }
}
