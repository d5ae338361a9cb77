//! API Routes
//!
//! Configures the Axum router: the worker's own endpoints plus the
//! intercepting fallback route.

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{fetch_handler, health_handler, message_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /__worker/message` - Send a control message
/// - `GET /__worker/health` - Worker status and storage counters
/// - anything else - intercepted and served through the cache, with no
///   request body limit so uploads reach the upstream intact
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__worker/message", post(message_handler))
        .route("/__worker/health", get(health_handler))
        .fallback(fetch_handler.layer(DefaultBodyLimit::disable()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
