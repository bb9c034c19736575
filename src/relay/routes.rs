//! Router configuration for the relay.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::RelayState;

/// `/health` plus a catch-all forwarder.
pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .fallback(handlers::forward)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
