//! Web layer - HTTP handlers and routing
//!
//! This module contains the pages of the image generator:
//! - Login and logout
//! - Prompt form and generated image
//! - Health probe

pub mod auth;
pub mod generate;
pub mod middleware;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub use middleware::{AppState, CurrentSession, WebError, SESSION_COOKIE};

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    // Every page works on a session; the health probe does not need one
    let pages = Router::new()
        .merge(auth::router())
        .merge(generate::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(pages)
        // Generated pages carry the image inline
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
