use cropline_core::CropError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Unsupported crop specification: {0}")]
    InvalidSpec(String),
}

impl From<RenderError> for CropError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidSpec(msg) => CropError::InvalidSpec(msg),
            other => CropError::Render(other.to_string()),
        }
    }
}

impl From<CropError> for RenderError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::InvalidSpec(msg) => RenderError::InvalidSpec(msg),
            other => RenderError::InvalidSpec(other.to_string()),
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Decode(err.to_string())
    }
}
