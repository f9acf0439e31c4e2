//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, limits_handler, pressure_handler,
    set_handler, stats_handler, trim_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a value in both tiers
/// - `GET /get/:key` - Retrieve a value (memory, then disk)
/// - `DELETE /del/:key` - Remove a key from both tiers
/// - `DELETE /all` - Remove every entry
/// - `POST /trim` - Remove entries last accessed before a date
/// - `PUT /limits` - Set the cost and disk size limits
/// - `POST /pressure` - Deliver a memory pressure event
/// - `GET /stats` - Per-tier statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/all", delete(clear_handler))
        .route("/trim", post(trim_handler))
        .route("/limits", put(limits_handler))
        .route("/pressure", post(pressure_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
