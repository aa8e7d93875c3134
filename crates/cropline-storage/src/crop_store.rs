//! Crop-level operations over a source disk and a crops disk.
//!
//! Crop keys are encoded paths: a crop of `photos/a.jpg` is stored as
//! `photos/a-<dims><options>.jpg` beside where the source would be on the
//! crops disk. Finding every crop of a source therefore needs no index, only
//! a listing of that directory filtered through the codec.

use std::sync::Arc;

use bytes::Bytes;
use cropline_core::{PathCodec, SourceRef};

use crate::traits::{Storage, StorageResult};
use crate::StorageBackend;

#[derive(Clone)]
pub struct CropStore {
    sources: Arc<dyn Storage>,
    crops: Arc<dyn Storage>,
    codec: PathCodec,
}

impl CropStore {
    pub fn new(sources: Arc<dyn Storage>, crops: Arc<dyn Storage>, codec: PathCodec) -> Self {
        CropStore {
            sources,
            crops,
            codec,
        }
    }

    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    /// Whether an artifact is persisted under this crop key.
    pub async fn exists(&self, crop_key: &str) -> StorageResult<bool> {
        self.crops.exists(crop_key).await
    }

    pub async fn read(&self, crop_key: &str) -> StorageResult<Bytes> {
        self.crops.download(crop_key).await
    }

    /// Persist rendered bytes and return the artifact location (its key).
    ///
    /// Writing the same bytes again leaves the same artifact at the same location.
    pub async fn write(
        &self,
        crop_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.crops
            .upload_with_key(crop_key, data, content_type)
            .await?;
        Ok(crop_key.to_string())
    }

    pub async fn read_source(&self, source: &SourceRef) -> StorageResult<Bytes> {
        self.sources.download(source.as_str()).await
    }

    pub async fn source_exists(&self, source: &SourceRef) -> StorageResult<bool> {
        self.sources.exists(source.as_str()).await
    }

    pub async fn delete_crop(&self, crop_key: &str) -> StorageResult<()> {
        self.crops.delete(crop_key).await
    }

    /// Keys of every persisted crop whose decoded source is `source`.
    pub async fn crops_of(&self, source: &SourceRef) -> StorageResult<Vec<String>> {
        let listed = self.crops.list_dir(source.directory()).await?;
        Ok(listed
            .into_iter()
            .filter(|key| key != source.as_str())
            .filter(|key| self.codec.is_crop_of(key, source))
            .collect())
    }

    /// Delete every crop of `source`, returning the keys removed.
    ///
    /// Stops at the first failed delete; crops removed before it stay removed.
    pub async fn delete_all_crops_of(&self, source: &SourceRef) -> StorageResult<Vec<String>> {
        let keys = self.crops_of(source).await?;
        for key in &keys {
            self.crops.delete(key).await?;
        }

        tracing::info!(
            source = %source,
            deleted = keys.len(),
            "Deleted crops of source"
        );

        Ok(keys)
    }

    pub async fn delete_source(&self, source: &SourceRef) -> StorageResult<()> {
        self.sources.delete(source.as_str()).await
    }

    pub fn crops_backend(&self) -> StorageBackend {
        self.crops.backend_type()
    }

    pub fn crops_are_remote(&self) -> bool {
        self.crops_backend().is_remote()
    }

    /// Absolute public URL of a crop location on the crops disk.
    pub fn resolve_url(&self, location: &str) -> String {
        self.crops.public_url(location)
    }
}
