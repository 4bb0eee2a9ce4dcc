//! Snapshot Task
//!
//! Background task that periodically writes a cache snapshot to disk.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{duration_ms, Cache};
use crate::persistence::SnapshotPersistence;

/// Spawns a background task that flushes a snapshot every
/// `persistence.interval()`.
///
/// Failed flushes are logged inside [`SnapshotPersistence::flush`] and the
/// loop carries on with the next cycle.
pub fn spawn_persistence_task<V>(
    cache: Cache<V>,
    persistence: Arc<SnapshotPersistence>,
) -> JoinHandle<()>
where
    V: Serialize + Send + 'static,
{
    tokio::spawn(async move {
        let interval = persistence.interval();
        info!(
            interval_ms = duration_ms(interval),
            file = %persistence.snapshot_path().display(),
            "Starting cache snapshot task"
        );

        loop {
            tokio::time::sleep(interval).await;
            persistence.flush(&cache).await;
        }
    })
}
