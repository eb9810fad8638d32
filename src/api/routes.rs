//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clean_handler, dedupe_handler, health_handler, jail_handler, links_handler, release_handler,
    reset_handler, save_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache statistics
/// - `GET /links/:fingerprint` - Links recorded for one feed
/// - `GET /jail` - Current login jail state
/// - `POST /jail/release` - Lift the login jail
/// - `POST /dedupe` - Remove duplicate entries
/// - `POST /clean` - Evict links of unknown feeds
/// - `POST /reset/:key` - Restore a template key to its default
/// - `POST /save` - Flush the snapshot
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/links/:fingerprint", get(links_handler))
        .route("/jail", get(jail_handler))
        .route("/jail/release", post(release_handler))
        .route("/dedupe", post(dedupe_handler))
        .route("/clean", post(clean_handler))
        .route("/reset/:key", post(reset_handler))
        .route("/save", post(save_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
