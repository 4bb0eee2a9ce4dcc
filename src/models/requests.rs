//! Request DTOs for the cache ops API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::models::MAX_KEY_LENGTH;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl_ms`: Optional TTL in milliseconds (uses default if not specified)
/// - `tags`: Optional tags for bulk invalidation
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
    /// Tags to register the key under
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl_ms == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        if self.tags.iter().any(|tag| tag.is_empty()) {
            return Some("Tags cannot be empty".to_string());
        }
        None
    }
}
