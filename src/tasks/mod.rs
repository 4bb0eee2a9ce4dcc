//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at configured intervals
//! - Snapshot: Writes the live cache to disk at configured intervals

mod cleanup;
mod persist;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::Cache;
use crate::persistence::SnapshotPersistence;

pub use cleanup::spawn_cleanup_task;
pub use persist::spawn_persistence_task;

// == Background Tasks ==
/// Handles of the running timers, stopped together on shutdown.
#[derive(Debug)]
pub struct BackgroundTasks {
    cleanup: JoinHandle<()>,
    persistence: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Starts the reaper and, when given, the snapshot timer.
    pub fn spawn<V>(
        cache: &Cache<V>,
        cleanup_interval: Duration,
        persistence: Option<Arc<SnapshotPersistence>>,
    ) -> Self
    where
        V: Serialize + Send + 'static,
    {
        Self {
            cleanup: spawn_cleanup_task(cache.clone(), cleanup_interval),
            persistence: persistence.map(|p| spawn_persistence_task(cache.clone(), p)),
        }
    }

    /// Aborts both timers and waits until they have stopped.
    ///
    /// Once this returns no background sweep or snapshot can run, so a final
    /// flush afterwards cannot race them.
    pub async fn shutdown(self) {
        let handles = std::iter::once(self.cleanup).chain(self.persistence);
        for handle in handles {
            handle.abort();
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "background task ended abnormally");
                }
            }
        }
        info!("Background tasks stopped");
    }
}

/// Stops the timers, then performs the best-effort final snapshot.
pub async fn shutdown<V>(
    cache: &Cache<V>,
    tasks: BackgroundTasks,
    persistence: Option<&SnapshotPersistence>,
) where
    V: Serialize + Send + 'static,
{
    tasks.shutdown().await;
    if let Some(persistence) = persistence {
        if let Some(report) = persistence.flush(cache).await {
            info!(persisted = report.persisted, "Final cache snapshot written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_shutdown_stops_tasks_then_flushes() {
        let dir = TempDir::new().unwrap();
        let persistence = Arc::new(
            SnapshotPersistence::new(dir.path()).with_interval(Duration::from_secs(3600)),
        );
        let cache: Cache<String> = Cache::new(CacheStore::new(10, Duration::from_secs(60)));

        let tasks = BackgroundTasks::spawn(
            &cache,
            Duration::from_secs(3600),
            Some(Arc::clone(&persistence)),
        );
        cache.set("lease:9", "signed".to_string(), None);

        // The periodic timer never fired, so only the final flush writes
        assert!(!persistence.snapshot_path().exists());
        shutdown(&cache, tasks, Some(&*persistence)).await;

        let restored: Cache<String> = Cache::new(CacheStore::new(10, Duration::from_secs(60)));
        assert_eq!(persistence.load_into(&restored).await.restored(), 1);
        assert_eq!(restored.get("lease:9"), Some("signed".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_without_persistence() {
        let cache: Cache<u8> = Cache::new(CacheStore::new(10, Duration::from_secs(60)));
        let tasks = BackgroundTasks::spawn(&cache, Duration::from_millis(10), None);

        shutdown(&cache, tasks, None).await;
    }
}
