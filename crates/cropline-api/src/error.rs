//! HTTP error response conversion
//!
//! Handlers return `Result<Response, HttpAppError>`; anything convertible into
//! `CropError` renders through `IntoResponse` below with a consistent status,
//! body and log line. Not-found classes share one body so a requester cannot
//! tell a forged token from a missing image.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cropline_core::{CropError, ErrorMetadata, LogLevel};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for CropError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for CropError (external type from cropline-core)
#[derive(Debug)]
pub struct HttpAppError(pub CropError);

impl From<CropError> for HttpAppError {
    fn from(err: CropError) -> Self {
        HttpAppError(err)
    }
}

fn log_error(error: &CropError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let crop_error = &self.0;

        let status = StatusCode::from_u16(crop_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(crop_error);

        // Details only leave the process outside production and for non-sensitive errors.
        let body = if is_production_env() || crop_error.is_sensitive() {
            ErrorResponse {
                error: crop_error.client_message(),
                details: None,
                error_type: None,
                code: crop_error.error_code().to_string(),
            }
        } else {
            ErrorResponse {
                error: crop_error.client_message(),
                details: Some(crop_error.to_string()),
                error_type: Some(crop_error.error_type().to_string()),
                code: crop_error.error_code().to_string(),
            }
        };

        (status, Json(body)).into_response()
    }
}
