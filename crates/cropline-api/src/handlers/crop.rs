//! Crop route: serves or redirects to the artifact behind an encoded path.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use cropline_core::CropError;
use cropline_services::Materialized;
use std::collections::HashMap;
use std::sync::Arc;

/// Crop bytes never change for a given path.
const CROP_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Answer `GET /<encoded path>?token=...`.
///
/// Local crops come back as bytes, remote crops as a permanent redirect to
/// their public URL. A path the router cannot extract is reported like any
/// other unknown crop.
#[tracing::instrument(skip(state, path, query), fields(operation = "serve_crop"))]
pub async fn serve_crop(
    path: Result<Path<String>, PathRejection>,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let Path(path) = path.map_err(|e| CropError::InvalidPath(e.body_text()))?;
    let token = query.get("token").map(String::as_str);

    let outcome = state.materializer().handle(&path, token).await?;

    let response = match outcome {
        Materialized::Inline {
            bytes,
            content_type,
            ..
        } => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, CROP_CACHE_CONTROL)
            .body(Body::from(bytes)),
        Materialized::Redirect { url } => Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(header::LOCATION, url)
            .body(Body::empty()),
    };

    response.map_err(|e| {
        tracing::error!(error = %e, "Failed to build response");
        HttpAppError::from(CropError::Render(e.to_string()))
    })
}

/// Anything the router does not know is a missing crop.
pub async fn not_found() -> HttpAppError {
    HttpAppError(CropError::InvalidPath("no matching route".to_string()))
}
