//! Cropline Services Layer
//!
//! Orchestration on top of the codec, storage and processing crates:
//! `Materializer` answers crop requests, `Cropper` is the application-facing
//! API (URLs, tags, forced renders, deletion). HTTP and CLI adapters depend on
//! this crate only.

pub mod cropper;
pub mod materializer;
pub mod resolution_cache;
pub mod single_flight;

pub use cropper::{CropUrl, Cropper, DeleteReport};
pub use materializer::{Materialized, Materializer};
pub use resolution_cache::{cache_key, LruResolutionCache, ResolutionCache};
pub use single_flight::SingleFlight;

pub use cropline_core::{CropError, CropOption, CropSpec, CroplineConfig, PathCodec, SourceRef};
pub use cropline_processing::{CropRenderer, ImageRenderer, RenderDefaults};
pub use cropline_storage::{create_storage, CropStore, Storage, StorageBackend, StorageError};
