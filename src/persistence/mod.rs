//! Persistence Module
//!
//! Periodic snapshots of the live cache to local disk, reloaded at startup for
//! warm restarts.
//!
//! Every failure is logged and swallowed by [`SnapshotPersistence::flush`] and
//! [`SnapshotPersistence::load_into`]; the cache keeps running in memory only
//! for that cycle. The `try_*` variants surface the error for tests and ops.

mod codec;
mod file;
mod snapshot;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{duration_ms, Cache};
use crate::config::Config;
use crate::error::PersistenceError;

pub use codec::SnapshotCodec;
pub use snapshot::{CaptureReport, LoadOutcome, PersistedEntry, Snapshot, SnapshotLimits};

// == Snapshot Persistence ==
/// Snapshot settings plus the save and load operations.
#[derive(Debug, Clone)]
pub struct SnapshotPersistence {
    /// Directory holding the snapshot file
    dir: PathBuf,
    /// Interval between periodic flushes
    interval: Duration,
    /// Snapshots older than this are ignored on load
    max_age: Duration,
    limits: SnapshotLimits,
    codec: SnapshotCodec,
    /// Held for the whole capture and write, so flushes never share the temp file
    flush_lock: Arc<Mutex<()>>,
}

impl SnapshotPersistence {
    // == Constructors ==
    /// Creates persistence rooted at `dir` with default limits.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            interval: Duration::from_secs(5 * 60),
            max_age: Duration::from_secs(60 * 60),
            limits: SnapshotLimits::default(),
            codec: SnapshotCodec::Plain,
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Builds persistence from configuration, or `None` when it is disabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.enable_persistence {
            return None;
        }
        Some(
            Self::new(&config.persistence_path)
                .with_interval(config.persistence_interval)
                .with_max_age(config.snapshot_max_age)
                .with_codec(config.snapshot_compression)
                .with_limits(SnapshotLimits {
                    max_entry_size: config.max_persisted_entry_size,
                    max_snapshot_size: config.max_snapshot_size,
                }),
        )
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_limits(mut self, limits: SnapshotLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_codec(mut self, codec: SnapshotCodec) -> Self {
        self.codec = codec;
        self
    }

    // == Accessors ==
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(self.codec.file_name())
    }

    // == Flush ==
    /// Captures the cache and writes the snapshot, propagating failures.
    ///
    /// Concurrent flushes (timer, manual, shutdown) run one after the other.
    pub async fn try_flush<V>(&self, cache: &Cache<V>) -> Result<CaptureReport, PersistenceError>
    where
        V: Serialize + Send + 'static,
    {
        let _guard = self.flush_lock.lock().await;
        let started = Instant::now();
        let (snapshot, report) = cache.with_store(|store| snapshot::capture(store, &self.limits));

        let json = serde_json::to_vec(&snapshot)?;
        let bytes = self.codec.encode(&json).map_err(PersistenceError::Codec)?;
        let path = self.snapshot_path();
        file::write_atomic(&path, &bytes).await?;

        debug!(
            persisted = report.persisted,
            skipped_unserializable = report.unserializable,
            skipped_oversized = report.oversized,
            skipped_over_budget = report.over_budget,
            bytes = bytes.len(),
            elapsed_ms = duration_ms(started.elapsed()),
            file = %path.display(),
            "cache snapshot written"
        );
        Ok(report)
    }

    /// Best-effort flush: failures are logged and the cycle is skipped.
    pub async fn flush<V>(&self, cache: &Cache<V>) -> Option<CaptureReport>
    where
        V: Serialize + Send + 'static,
    {
        match self.try_flush(cache).await {
            Ok(report) => Some(report),
            Err(err) => {
                error!(error = %err, "cache snapshot failed, continuing in memory only");
                None
            }
        }
    }

    // == Load ==
    /// Reads the snapshot and restores live entries, propagating failures.
    ///
    /// A missing file is not an error and yields [`LoadOutcome::Missing`].
    pub async fn try_load<V>(&self, cache: &Cache<V>) -> Result<LoadOutcome, PersistenceError>
    where
        V: DeserializeOwned + Send + 'static,
    {
        let path = self.snapshot_path();
        let bytes = match file::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.is_missing_snapshot() => {
                debug!(file = %path.display(), "no cache snapshot to load");
                return Ok(LoadOutcome::Missing);
            }
            Err(err) => return Err(err),
        };

        let json = SnapshotCodec::decode(&bytes).map_err(|e| PersistenceError::CorruptSnapshot {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let record: Snapshot =
            serde_json::from_slice(&json).map_err(|e| PersistenceError::CorruptSnapshot {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let max_age_ms = duration_ms(self.max_age);
        let decoded = match snapshot::decode::<V>(record, cache.now_ms(), max_age_ms) {
            Ok(decoded) => decoded,
            Err(age_ms) => {
                info!(
                    age_minutes = age_ms / 60_000,
                    file = %path.display(),
                    "cache snapshot too old, ignoring"
                );
                return Ok(LoadOutcome::Stale { age_ms });
            }
        };

        let outcome = cache.with_store(|store| snapshot::apply(store, decoded));
        if let LoadOutcome::Restored {
            restored,
            expired,
            undecodable,
            age_ms,
        } = outcome
        {
            info!(
                restored,
                expired,
                undecodable,
                age_minutes = age_ms / 60_000,
                file = %path.display(),
                "cache snapshot loaded"
            );
        }
        Ok(outcome)
    }

    /// Best-effort load: failures are logged and the cache starts cold.
    pub async fn load_into<V>(&self, cache: &Cache<V>) -> LoadOutcome
    where
        V: DeserializeOwned + Send + 'static,
    {
        match self.try_load(cache).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "could not load cache snapshot, starting cold");
                LoadOutcome::Failed
            }
        }
    }
}
