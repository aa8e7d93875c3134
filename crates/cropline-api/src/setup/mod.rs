//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use cropline_core::CroplineConfig;
use cropline_services::Cropper;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: CroplineConfig) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        src_disk = %config.src_disk.backend,
        crops_disk = %config.crops_disk.backend,
        signed = config.signed,
        cache_enabled = config.cache.enabled,
        "Configuration loaded and validated successfully"
    );

    let state = build_state(config).await?;
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}

/// Wire storage, renderer and cache into the shared state.
pub async fn build_state(config: CroplineConfig) -> Result<Arc<AppState>> {
    let config = Arc::new(config);
    let cropper = Cropper::from_config(config.clone())
        .await
        .context("Failed to initialize crop services")?;
    Ok(Arc::new(AppState::new(config, cropper)))
}
