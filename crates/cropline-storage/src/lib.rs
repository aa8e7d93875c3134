//! Cropline Storage Library
//!
//! The `Storage` trait abstracts a disk (local filesystem or object store) and
//! `CropStore` builds the crop-specific operations on top of one disk for
//! sources and one for crops.
//!
//! # Storage key format
//!
//! Keys are paths relative to the disk root: a source lives at its source path
//! (`photos/a.jpg`) and each crop at its encoded path (`photos/a-100x50-crop.jpg`),
//! so every crop sits in the same directory as its source and starts with the
//! source stem. Keys must not contain `..` or a leading `/`.

pub mod crop_store;
pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use crop_store::CropStore;
pub use cropline_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{ObjectStorage, S3Storage};
pub use traits::{Storage, StorageError, StorageResult};
