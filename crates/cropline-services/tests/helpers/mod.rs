#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use cropline_core::{CacheConfig, CropSpec, CroplineConfig, PathCodec};
use cropline_processing::{CropRenderer, RenderError};
use cropline_services::{Cropper, Materializer, ResolutionCache, LruResolutionCache};
use cropline_storage::{
    CropStore, LocalStorage, ObjectStorage, Storage, StorageBackend, StorageError, StorageResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SECRET: &str = "test-secret";
pub const CDN: &str = "https://cdn.example.com";

/// Renderer that records calls and returns bytes derived from its inputs.
#[derive(Default)]
pub struct CountingRenderer {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingRenderer {
    pub fn failing() -> Self {
        CountingRenderer {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CropRenderer for CountingRenderer {
    fn render(
        &self,
        source: &[u8],
        spec: &CropSpec,
        source_extension: &str,
    ) -> Result<Bytes, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Long enough for concurrent callers to pile up on the same crop
        std::thread::sleep(Duration::from_millis(20));
        if self.fail {
            return Err(RenderError::Decode("corrupt source".to_string()));
        }
        Ok(Bytes::from(format!(
            "{:?}x{:?}:{}:{}",
            spec.width,
            spec.height,
            source.len(),
            source_extension
        )))
    }
}

pub struct Fixture {
    pub _dir: TempDir,
    pub renderer: Arc<CountingRenderer>,
    pub sources: Arc<dyn Storage>,
    pub crops: Arc<dyn Storage>,
    pub cache: Arc<LruResolutionCache>,
    pub cropper: Cropper,
}

impl Fixture {
    pub fn materializer(&self) -> &Materializer {
        self.cropper.materializer()
    }

    pub async fn put_source(&self, key: &str) {
        self.sources
            .upload_with_key(key, Bytes::from_static(b"source-bytes"), "image/jpeg")
            .await
            .unwrap();
    }
}

pub fn test_config() -> CroplineConfig {
    CroplineConfig {
        secret: SECRET.to_string(),
        cache: CacheConfig {
            enabled: false,
            ttl: Duration::from_secs(60),
            capacity: 100,
        },
        ..Default::default()
    }
}

pub async fn fixture_with(
    remote_crops: bool,
    renderer: CountingRenderer,
    configure: impl FnOnce(&mut CroplineConfig),
) -> Fixture {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    configure(&mut config);
    let config = Arc::new(config);

    let sources: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(dir.path(), "/".to_string())
            .await
            .unwrap(),
    );
    let crops: Arc<dyn Storage> = if remote_crops {
        Arc::new(ObjectStorage::in_memory(CDN))
    } else {
        sources.clone()
    };

    assemble(dir, config, sources, crops, renderer)
}

/// Fixture over caller-provided disks with the default test configuration.
pub async fn fixture_on_disks(sources: Arc<dyn Storage>, crops: Arc<dyn Storage>) -> Fixture {
    let dir = TempDir::new().unwrap();
    assemble(
        dir,
        Arc::new(test_config()),
        sources,
        crops,
        CountingRenderer::default(),
    )
}

fn assemble(
    dir: TempDir,
    config: Arc<CroplineConfig>,
    sources: Arc<dyn Storage>,
    crops: Arc<dyn Storage>,
    renderer: CountingRenderer,
) -> Fixture {
    let store = CropStore::new(sources.clone(), crops.clone(), PathCodec::new(&config));
    let renderer = Arc::new(renderer);
    let cache = Arc::new(LruResolutionCache::new(config.cache.capacity));
    let materializer = Materializer::new(
        config,
        store,
        renderer.clone() as Arc<dyn CropRenderer>,
        Some(cache.clone() as Arc<dyn ResolutionCache>),
    )
    .unwrap();

    Fixture {
        _dir: dir,
        renderer,
        sources,
        crops,
        cache,
        cropper: Cropper::new(Arc::new(materializer)),
    }
}

/// Disk that serves reads and writes from `inner` but fails every delete.
pub struct RefusingDeletes(pub Arc<dyn Storage>);

#[async_trait]
impl Storage for RefusingDeletes {
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        self.0.download(storage_key).await
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.0.upload_with_key(storage_key, data, content_type).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        Err(StorageError::DeleteFailed(format!(
            "{} is on a read-only disk",
            storage_key
        )))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.0.exists(storage_key).await
    }

    async fn list_dir(&self, directory: &str) -> StorageResult<Vec<String>> {
        self.0.list_dir(directory).await
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.0.public_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.0.backend_type()
    }
}

pub async fn fixture(remote_crops: bool) -> Fixture {
    fixture_with(remote_crops, CountingRenderer::default(), |_| {}).await
}

/// Disk whose next read, once armed, removes the object first.
///
/// Stands in for a reset landing between a crop's existence check and its read.
pub struct VanishOnRead {
    inner: Arc<dyn Storage>,
    armed: AtomicBool,
}

impl VanishOnRead {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        VanishOnRead {
            inner,
            armed: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for VanishOnRead {
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.inner.delete(storage_key).await?;
        }
        self.inner.download(storage_key).await
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.inner.upload_with_key(storage_key, data, content_type).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn list_dir(&self, directory: &str) -> StorageResult<Vec<String>> {
        self.inner.list_dir(directory).await
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.inner.public_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
