//! API Routes
//!
//! Configures the Axum router with all ops endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_handler, delete_handler, entry_handler, get_handler, has_handler,
    health_handler, invalidate_tag_handler, keys_handler, persist_handler, set_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a JSON value with optional TTL and tags
/// - `GET /get/:key` - Retrieve a value by key
/// - `GET /has/:key` - Check for a live key
/// - `DELETE /del/:key` - Delete a key
/// - `DELETE /tags/:tag` - Delete every key registered under a tag
/// - `POST /cleanup` - Run the expiry sweep now
/// - `POST /clear` - Remove every entry
/// - `POST /persist` - Write a snapshot now
/// - `GET /stats` - Cache statistics
/// - `GET /keys` - Stored keys
/// - `GET /entry/:key` - Metadata of one entry
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/has/:key", get(has_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/tags/:tag", delete(invalidate_tag_handler))
        .route("/cleanup", post(cleanup_handler))
        .route("/clear", post(clear_handler))
        .route("/persist", post(persist_handler))
        .route("/stats", get(stats_handler))
        .route("/keys", get(keys_handler))
        .route("/entry/:key", get(entry_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
