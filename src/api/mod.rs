//! API Module
//!
//! HTTP handlers and routing for the local ops surface of the cache. The
//! application uses the library API directly; this router exposes the same
//! instance for inspection and manual maintenance.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
