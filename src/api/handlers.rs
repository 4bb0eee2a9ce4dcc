//! API Handlers
//!
//! HTTP request handlers for each ops endpoint. Handlers only translate
//! between JSON and the shared [`Cache`] handle; the cache itself never fails.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, EntryResponse, GetResponse, HasResponse, HealthResponse, InvalidateResponse,
    KeysResponse, PersistResponse, RemovedResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::persistence::SnapshotPersistence;

/// Application state shared across all handlers.
///
/// Holds the process's cache instance and, when enabled, its snapshot
/// persistence. Both are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache handle
    pub cache: Cache<Value>,
    /// Snapshot persistence, `None` when disabled
    pub persistence: Option<Arc<SnapshotPersistence>>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache<Value>, persistence: Option<Arc<SnapshotPersistence>>) -> Self {
        Self { cache, persistence }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Cache::from_config(config),
            SnapshotPersistence::from_config(config).map(Arc::new),
        )
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value with optional TTL and tags.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl_ms.map(Duration::from_millis);
    if req.tags.is_empty() {
        state.cache.set(req.key.clone(), req.value, ttl);
    } else {
        state.cache.set_with_tags(req.key.clone(), req.value, req.tags, ttl);
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Absent and expired keys both answer 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let exists = state.cache.has(&key);
    Json(HasResponse { key, exists })
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /tags/:tag
///
/// An unknown tag is not an error and removes nothing.
pub async fn invalidate_tag_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate_by_tag(&tag);
    Json(InvalidateResponse { tag, removed })
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    Json(RemovedResponse {
        removed: state.cache.cleanup(),
    })
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.with_store(|store| {
        let removed = store.len();
        store.clear();
        removed
    });
    Json(RemovedResponse { removed })
}

/// Handler for POST /persist
///
/// Writes a snapshot immediately, outside the periodic timer.
pub async fn persist_handler(State(state): State<AppState>) -> Result<Json<PersistResponse>> {
    let persistence = state
        .persistence
        .as_ref()
        .ok_or(CacheError::PersistenceDisabled)?;

    let report = persistence
        .try_flush(&state.cache)
        .await
        .map_err(|e| CacheError::Internal(e.to_string()))?;
    info!(persisted = report.persisted, "manual cache snapshot written");

    Ok(Json(PersistResponse {
        file: persistence.snapshot_path().display().to_string(),
        report,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys()))
}

/// Handler for GET /entry/:key
///
/// Metadata only; does not count as an access.
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let info = state
        .cache
        .entry_info(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse { key, info }))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.len()))
}
