//! API Handlers
//!
//! HTTP request handlers for each cache store endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::models::requests::validate_key;
use crate::models::{ApiResponse, HealthResponse, PutRequest, StatsResponse};

/// Application state shared across all handlers.
///
/// Contains the cache store wrapped in Arc<RwLock<>> for thread-safe access.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(CacheStore::new(config.max_entries, config.default_ttl))
    }
}

/// Handler for GET /api/v2/utils/cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    // Write lock: expired entries are removed on read
    let mut cache = state.cache.write().await;
    let value = cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(ApiResponse::ok(value)))
}

/// Handler for POST /api/v2/utils/cache
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<ApiResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    let ttl = cache.effective_ttl(req.ttl);
    if let Some(evicted) = cache.set(req.key.clone(), req.data, Some(ttl)) {
        debug!(key = %req.key, evicted = %evicted, "store at capacity, evicted oldest");
    }

    Ok(Json(
        ApiResponse::ok(json!({ "key": req.key, "ttl": ttl }))
            .with_message(format!("Key '{}' set successfully", req.key)),
    ))
}

/// Handler for DELETE /api/v2/utils/cache/:key
///
/// Deleting an absent key still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    let removed = cache.delete(&key);

    Ok(Json(
        ApiResponse::ok(json!({ "key": key, "removed": removed }))
            .with_message(format!("Key '{}' deleted", key)),
    ))
}

/// Handler for DELETE /api/v2/utils/cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ApiResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.clear();

    Json(ApiResponse::ok(json!({ "removed": removed })).with_message("Cache cleared"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for unknown routes, answered with the envelope.
pub async fn not_found_handler() -> (axum::http::StatusCode, Json<ApiResponse<Value>>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Route not found")),
    )
}
