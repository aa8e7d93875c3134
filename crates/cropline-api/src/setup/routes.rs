//! Route configuration

use crate::handlers::{crop, health};
use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

/// Upper bound on requests rendering or serving at once.
const HTTP_CONCURRENCY_LIMIT: usize = 256;

/// Build the router. The URL prefix is not mounted here: the crop handler
/// receives the whole request path and the codec strips the prefix.
pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/{*path}", get(crop::serve_crop))
        .fallback(crop::not_found)
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(TraceLayer::new_for_http())
}
