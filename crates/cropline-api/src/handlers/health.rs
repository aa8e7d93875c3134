//! Health check handler and response type.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, serde::Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub storage: String,
    pub crops_backend: String,
    pub signed: bool,
    pub cache_enabled: bool,
}

/// Liveness plus a lightweight storage check.
///
/// Storage trouble degrades the report but never fails it; the crop route
/// surfaces storage errors per request.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.materializer().store();

    // A non-existent key checks connectivity without writing anything
    let storage = match tokio::time::timeout(TIMEOUT, store.exists("health-check-non-existent-key"))
        .await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage health check warning");
            format!("degraded: {}", e)
        }
        Err(_) => {
            tracing::warn!("Storage health check timed out");
            "timeout".to_string()
        }
    };

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        storage,
        crops_backend: store.crops_backend().to_string(),
        signed: state.config.signed,
        cache_enabled: state.config.cache.enabled,
    };

    (StatusCode::OK, Json(response))
}
