use crate::keys::{validate_key, with_prefix};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use cropline_core::URL_PATH_ENCODE_SET;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::sync::Arc;

/// Storage on top of any `object_store` backend.
///
/// Production disks use [`S3Storage`]; tests use the in-memory store, which
/// reports itself as a remote backend so the remote code paths are exercised.
#[derive(Clone)]
pub struct ObjectStorage<S> {
    store: Arc<S>,
    bucket: String,
    /// Base of public URLs, without trailing slash
    public_base: String,
    key_prefix: Option<String>,
}

/// S3 (or S3-compatible) storage
pub type S3Storage = ObjectStorage<AmazonS3>;

impl ObjectStorage<AmazonS3> {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `key_prefix` - Optional folder inside the bucket all keys live under
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        key_prefix: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment, location from explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        // Path-style URLs for S3-compatible providers: {endpoint}/{bucket}/{key}
        let public_base = match endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Ok(ObjectStorage {
            store: Arc::new(store),
            bucket,
            public_base,
            key_prefix,
        })
    }
}

impl ObjectStorage<InMemory> {
    /// In-memory object storage whose public URLs start with `public_base`.
    pub fn in_memory(public_base: impl Into<String>) -> Self {
        ObjectStorage {
            store: Arc::new(InMemory::new()),
            bucket: "memory".to_string(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
            key_prefix: None,
        }
    }
}

impl<S: ObjectStore> ObjectStorage<S> {
    fn location(&self, storage_key: &str) -> StorageResult<Path> {
        validate_key(storage_key)?;
        Ok(Path::from(with_prefix(
            self.key_prefix.as_deref(),
            storage_key,
        )))
    }

    fn prefix_path(&self) -> Option<Path> {
        self.key_prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(Path::from)
    }

    /// Turn a listed object path back into the storage key it was written under.
    ///
    /// `Path` percent-encodes characters such as `[` or `~` per segment, so
    /// each segment is decoded and the bucket key prefix is dropped.
    fn to_storage_key(&self, location: &Path) -> String {
        let parts: Vec<_> = match self.prefix_path() {
            Some(prefix) => match location.prefix_match(&prefix) {
                Some(rest) => rest.collect(),
                None => location.parts().collect(),
            },
            None => location.parts().collect(),
        };
        parts
            .iter()
            .map(|part| percent_decode_str(part.as_ref()).decode_utf8_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl<S: ObjectStore> Storage for ObjectStorage<S> {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        let size = data.len() as u64;
        let location = self.location(storage_key)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(data)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object storage upload_with_key failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object storage upload_with_key successful"
        );

        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        let start = std::time::Instant::now();
        let location = self.location(storage_key)?;

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object storage download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object storage download successful"
        );

        Ok(bytes)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = self.location(storage_key)?;

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object storage delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = self.location(storage_key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn list_dir(&self, directory: &str) -> StorageResult<Vec<String>> {
        let directory = directory.trim_matches('/');
        let full = with_prefix(self.key_prefix.as_deref(), directory);
        let prefix = (!full.is_empty()).then(|| Path::from(full));

        let listing = self
            .store
            .list_with_delimiter(prefix.as_ref())
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        let mut keys: Vec<String> = listing
            .objects
            .iter()
            .map(|meta| self.to_storage_key(&meta.location))
            .collect();
        keys.sort();

        Ok(keys)
    }

    /// URL of the object actually stored for `storage_key`.
    fn public_url(&self, storage_key: &str) -> String {
        let object_key = Path::from(with_prefix(self.key_prefix.as_deref(), storage_key));
        format!(
            "{}/{}",
            self.public_base,
            utf8_percent_encode(object_key.as_ref(), URL_PATH_ENCODE_SET)
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
