//! API Routes
//!
//! Configures the Axum router with all cache store endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, not_found_handler, put_handler,
    stats_handler, AppState,
};

/// Path prefix the cache routes live under; matches the default client base URL.
pub const API_PREFIX: &str = "/api/v2";

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cache_routes = Router::new()
        .route("/utils/cache", post(put_handler).delete(clear_handler))
        .route("/utils/cache/:key", get(get_handler).delete(delete_handler));

    Router::new()
        .nest(API_PREFIX, cache_routes)
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
