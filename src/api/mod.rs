//! API Module
//!
//! HTTP handlers and routing for the remote cache store.
//!
//! # Endpoints
//! - `GET /api/v2/utils/cache/:key` - Retrieve a value by key
//! - `POST /api/v2/utils/cache` - Store a value
//! - `DELETE /api/v2/utils/cache/:key` - Delete a key
//! - `DELETE /api/v2/utils/cache` - Delete every key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, API_PREFIX};
