//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{duration_ms, Cache};

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between cleanup runs. Each run holds the cache lock only for the sweep.
/// After the sweep the advisory memory budget is checked and a warning is
/// logged when it is exceeded.
///
/// # Arguments
/// * `cache` - Shared cache handle
/// * `interval` - Time between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Cache::from_config(&config);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(cache: Cache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = duration_ms(interval),
            "Starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }

            if cache.is_over_memory_budget() {
                let stats = cache.stats();
                warn!(
                    memory_usage = stats.memory_usage,
                    max_memory_usage = ?stats.max_memory_usage,
                    entries = stats.size,
                    "cache memory estimate above budget"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MockClock};
    use std::sync::Arc;

    fn test_cache(clock: &MockClock) -> Cache<String> {
        Cache::new(
            CacheStore::new(100, Duration::from_secs(300)).with_clock(Arc::new(clock.clone())),
        )
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = MockClock::new();
        let cache = test_cache(&clock);

        cache.set("expire_soon", "value".to_string(), Some(Duration::from_secs(1)));
        cache.set("long_lived", "value".to_string(), Some(Duration::from_secs(3600)));
        clock.advance_ms(1_500);

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Removed by the sweep, not by a read
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.get("long_lived"), Some("value".to_string()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = test_cache(&MockClock::new());

        let handle = spawn_cleanup_task(cache, Duration::from_millis(10));
        handle.abort();

        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
