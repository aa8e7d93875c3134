//! Application state shared by all handlers.

use cropline_core::CroplineConfig;
use cropline_services::{Cropper, Materializer};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CroplineConfig>,
    pub cropper: Cropper,
}

impl AppState {
    pub fn new(config: Arc<CroplineConfig>, cropper: Cropper) -> Self {
        AppState { config, cropper }
    }

    pub fn materializer(&self) -> &Arc<Materializer> {
        self.cropper.materializer()
    }
}
