//! Snapshot record and the capture/restore logic around it.
//!
//! Capture runs under the cache lock and only copies data. Decoding a loaded
//! snapshot happens before the lock is taken; only the final insert of live
//! entries runs under it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore, StatsCounters};

// == Snapshot Record ==
/// On-disk snapshot: `{ entries, saved_at, stats }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: BTreeMap<String, PersistedEntry>,
    /// Unix milliseconds at capture time
    pub saved_at: u64,
    pub stats: StatsCounters,
}

/// One serialized entry with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub value: serde_json::Value,
    pub inserted_at: u64,
    pub ttl_ms: u64,
    pub access_count: u64,
    pub last_accessed_at: u64,
    /// Serialized value size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

// == Limits ==
/// Size ceilings applied while capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    /// Entries whose serialized value reaches this many bytes are skipped
    pub max_entry_size: usize,
    /// Budget for the sum of persisted value sizes
    pub max_snapshot_size: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            max_entry_size: 1024 * 1024,
            max_snapshot_size: 64 * 1024 * 1024,
        }
    }
}

// == Capture ==
/// Outcome counters of one capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub persisted: usize,
    pub unserializable: usize,
    pub oversized: usize,
    pub over_budget: usize,
}

/// Copies every eligible live entry of `store` into a snapshot.
///
/// Measured sizes are recorded on the entries as size hints. When the
/// aggregate budget cannot hold everything, the most recently accessed
/// entries win.
pub(crate) fn capture<V: Serialize>(
    store: &mut CacheStore<V>,
    limits: &SnapshotLimits,
) -> (Snapshot, CaptureReport) {
    let now = store.now_ms();
    let mut report = CaptureReport::default();
    let mut candidates: Vec<(String, PersistedEntry, usize)> = Vec::new();

    for (key, entry) in store.live_entries_mut(now) {
        let value = match serde_json::to_value(&entry.value) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "entry skipped from snapshot: serialization failed");
                report.unserializable += 1;
                continue;
            }
        };

        let size = match entry.size_hint {
            Some(size) => size,
            None => {
                let size = value.to_string().len();
                entry.size_hint = Some(size);
                size
            }
        };

        if size >= limits.max_entry_size {
            debug!(key = %key, size, "entry skipped from snapshot: too large");
            report.oversized += 1;
            continue;
        }

        candidates.push((
            key.clone(),
            PersistedEntry {
                value,
                inserted_at: entry.inserted_at,
                ttl_ms: entry.ttl_ms,
                access_count: entry.access_count,
                last_accessed_at: entry.last_accessed_at,
                size: Some(size),
            },
            size,
        ));
    }

    candidates.sort_by(|a, b| b.1.last_accessed_at.cmp(&a.1.last_accessed_at));

    let mut entries = BTreeMap::new();
    let mut total = 0usize;
    for (key, persisted, size) in candidates {
        if total + size > limits.max_snapshot_size {
            report.over_budget += 1;
            continue;
        }
        total += size;
        entries.insert(key, persisted);
    }
    report.persisted = entries.len();

    let snapshot = Snapshot {
        entries,
        saved_at: now,
        stats: store.counters(),
    };
    (snapshot, report)
}

// == Restore ==
/// Outcome of decoding a loaded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    /// No snapshot file exists yet
    Missing,
    /// The snapshot could not be read or decoded; the cache starts cold
    Failed,
    /// The snapshot is older than the allowed age and was ignored
    Stale { age_ms: u64 },
    /// Entries were restored
    Restored {
        restored: usize,
        expired: usize,
        undecodable: usize,
        age_ms: u64,
    },
}

impl LoadOutcome {
    /// Number of entries put back into the cache.
    pub fn restored(&self) -> usize {
        match self {
            LoadOutcome::Restored { restored, .. } => *restored,
            _ => 0,
        }
    }
}

/// Decoded snapshot ready to be applied, oldest access first.
pub(crate) struct DecodedSnapshot<V> {
    entries: Vec<(String, CacheEntry<V>)>,
    stats: StatsCounters,
    undecodable: usize,
    age_ms: u64,
}

/// Checks the snapshot age and decodes its values.
///
/// A snapshot older than `max_age_ms` is rejected with its age as the error.
pub(crate) fn decode<V: DeserializeOwned>(
    snapshot: Snapshot,
    now: u64,
    max_age_ms: u64,
) -> Result<DecodedSnapshot<V>, u64> {
    let age_ms = now.saturating_sub(snapshot.saved_at);
    if age_ms > max_age_ms {
        return Err(age_ms);
    }

    let mut undecodable = 0;
    let mut entries: Vec<(String, CacheEntry<V>)> = snapshot
        .entries
        .into_iter()
        .filter_map(|(key, persisted)| {
            match serde_json::from_value::<V>(persisted.value) {
                Ok(value) => Some((
                    key,
                    CacheEntry {
                        value,
                        inserted_at: persisted.inserted_at,
                        ttl_ms: persisted.ttl_ms.max(1),
                        access_count: persisted.access_count,
                        last_accessed_at: persisted.last_accessed_at.max(persisted.inserted_at),
                        size_hint: persisted.size,
                    },
                )),
                Err(err) => {
                    warn!(key = %key, error = %err, "snapshot entry skipped: value does not decode");
                    undecodable += 1;
                    None
                }
            }
        })
        .collect();

    entries.sort_by_key(|(_, entry)| entry.last_accessed_at);

    Ok(DecodedSnapshot {
        entries,
        stats: snapshot.stats,
        undecodable,
        age_ms,
    })
}

/// Inserts the entries still live at the store's current time.
///
/// Entries go through the normal capacity path in ascending access order, so
/// if the snapshot holds more than fits, the most recently used ones stay.
pub(crate) fn apply<V>(store: &mut CacheStore<V>, decoded: DecodedSnapshot<V>) -> LoadOutcome {
    let now = store.now_ms();
    let mut restored = 0;
    let mut expired = 0;

    for (key, entry) in decoded.entries {
        if entry.is_expired_at(now) {
            expired += 1;
            continue;
        }
        store.restore(key, entry);
        restored += 1;
    }
    store.absorb_counters(&decoded.stats);

    LoadOutcome::Restored {
        restored,
        expired,
        undecodable: decoded.undecodable,
        age_ms: decoded.age_ms,
    }
}
