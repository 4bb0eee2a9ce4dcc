//! Shared Cache Handle
//!
//! Thread-safe handle over a [`CacheStore`]. Cloning the handle shares the
//! same store; construct one at startup and pass it to whoever needs it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::error;

use crate::cache::{CacheStats, CacheStore, Clock, EntryInfo, SystemClock};
use crate::config::Config;

// == Cache ==
/// Cheaply clonable, thread-safe cache handle.
///
/// Each call holds the store lock for its whole compound operation (for
/// example check, evict and insert in `set`), and the lock is never held
/// across an `.await`.
pub struct Cache<V> {
    store: Arc<Mutex<CacheStore<V>>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.lock();
        f.debug_struct("Cache")
            .field("len", &store.len())
            .field("max_size", &store.max_size())
            .finish()
    }
}

impl<V> Cache<V> {
    // == Constructors ==
    /// Wraps an existing store.
    pub fn new(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Creates a cache sized and tuned from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`Cache::from_config`] with a custom time source.
    pub fn from_config_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let store = CacheStore::new(config.max_size, config.default_ttl)
            .with_memory_budget(Some(config.max_memory_usage))
            .with_clock(clock);
        Self::new(store)
    }

    // == Writes ==
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.store.lock().set(key, value, ttl);
    }

    pub fn set_with_tags<I, S>(
        &self,
        key: impl Into<String>,
        value: V,
        tags: I,
        ttl: Option<Duration>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store.lock().set_with_tags(key, value, tags, ttl);
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.lock().has(key)
    }

    /// Sets a new TTL, counted from now, on a live key.
    pub fn expire(&self, key: &str, ttl: Duration) -> bool {
        self.store.lock().expire(key, ttl)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    pub fn clear(&self) {
        self.store.lock().clear();
    }

    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        self.store.lock().invalidate_by_tag(tag)
    }

    /// Runs the expiry sweep now. Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        self.store.lock().cleanup_expired()
    }

    // == Reads ==
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn is_over_memory_budget(&self) -> bool {
        self.store.lock().is_over_memory_budget()
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.lock().keys()
    }

    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        self.store.lock().entry_info(key)
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn now_ms(&self) -> u64 {
        self.store.lock().now_ms()
    }

    /// Runs `f` with exclusive access to the store.
    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&mut CacheStore<V>) -> R) -> R {
        let mut store = self.store.lock();
        f(&mut store)
    }
}

impl<V: Clone> Cache<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.lock().get(key)
    }

    // == Get Or Set ==
    /// Returns the cached value, or computes, stores and returns it.
    ///
    /// A failing `compute` is logged and its error returned; nothing is cached
    /// in that case. The lock is released while `compute` runs, so concurrent
    /// callers may compute the same key twice; the last write wins.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        match compute().await {
            Ok(value) => {
                self.set(key, value.clone(), ttl);
                Ok(value)
            }
            Err(err) => {
                error!(key = %key, error = %err, "get_or_set compute failed");
                Err(err)
            }
        }
    }
}
