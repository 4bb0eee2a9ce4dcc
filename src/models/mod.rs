//! Request and Response models for the cache ops API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::SetRequest;
pub use responses::{
    DeleteResponse, EntryResponse, GetResponse, HasResponse, HealthResponse, InvalidateResponse,
    KeysResponse, PersistResponse, RemovedResponse, SetResponse, StatsResponse,
};

/// Maximum allowed key length in bytes for keys written over HTTP
pub const MAX_KEY_LENGTH: usize = 256;
