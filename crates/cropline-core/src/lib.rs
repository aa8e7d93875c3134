//! Cropline Core Library
//!
//! Crop model, path codec, signing tokens, configuration and the error
//! taxonomy shared by every Cropline crate. Nothing in here performs I/O.

pub mod config;
pub mod crop_spec;
pub mod crop_url;
pub mod error;
pub mod signing;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CacheConfig, CroplineConfig, DiskConfig};
pub use crop_spec::{
    content_type_for_extension, CropOption, CropSpec, EncodedPath, Filter, OutputFormat,
    Quadrant, ResizeMode, SourceRef,
};
pub use crop_url::{PathCodec, URL_PATH_ENCODE_SET};
pub use error::{CropError, ErrorMetadata, LogLevel};
pub use signing::UrlSigner;
pub use storage_types::StorageBackend;
