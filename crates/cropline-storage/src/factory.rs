#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use cropline_core::DiskConfig;
use std::sync::Arc;

/// Create a storage backend for one disk
pub async fn create_storage(disk: &DiskConfig) -> StorageResult<Arc<dyn Storage>> {
    match disk.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = disk
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3 bucket not configured".to_string()))?;
            let region = disk.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3 region or AWS_REGION not configured".to_string())
            })?;

            let storage =
                S3Storage::new(bucket, region, disk.s3_endpoint.clone(), disk.s3_prefix.clone())
                    .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            if disk.local_path.trim().is_empty() {
                return Err(StorageError::ConfigError(
                    "Local disk path not configured".to_string(),
                ));
            }
            let storage = LocalStorage::new(&disk.local_path, disk.base_url.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
