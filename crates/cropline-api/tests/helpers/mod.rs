//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p cropline-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use cropline_api::setup::{build_state, routes};
use cropline_api::state::AppState;
use cropline_core::{CacheConfig, CroplineConfig, DiskConfig, PathCodec};
use cropline_services::{CropStore, Cropper, ImageRenderer, Materializer, RenderDefaults, Storage};
use cropline_storage::ObjectStorage;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SECRET: &str = "api-test-secret";
pub const CDN: &str = "https://cdn.example.com";

/// Test application: server plus the resources it owns.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn root(&self) -> &std::path::Path {
        self._temp_dir.path()
    }

    /// Place a PNG source of the given size at `key`.
    pub fn put_source(&self, key: &str, width: u32, height: u32) {
        let path = self.root().join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, png_bytes(width, height)).unwrap();
    }

    /// Request path and token for a crop of `src`.
    pub fn crop(&self, src: &str, width: u32, height: u32) -> (String, String) {
        let crop = self
            .state
            .cropper
            .url(src, Some(width), Some(height), vec![])
            .unwrap();
        (format!("/{}", crop.path), crop.token.unwrap())
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn test_config(root: &std::path::Path) -> CroplineConfig {
    let root = root.to_string_lossy().to_string();
    CroplineConfig {
        secret: SECRET.to_string(),
        src_disk: DiskConfig::local(root.clone(), "/"),
        crops_disk: DiskConfig::local(root, "/"),
        cache: CacheConfig {
            enabled: true,
            ttl: Duration::from_secs(60),
            capacity: 100,
        },
        ..Default::default()
    }
}

/// Setup test app with local disks in a temp dir.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(configure: impl FnOnce(&mut CroplineConfig)) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    configure(&mut config);

    let state = build_state(config).await.unwrap();
    let server = TestServer::new(routes::setup_routes(state.clone()))
        .expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

/// Sources on a local temp dir, crops in an in-memory object store.
pub async fn setup_remote_crops_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(temp_dir.path()));

    let sources: Arc<dyn Storage> = Arc::new(
        cropline_storage::LocalStorage::new(temp_dir.path(), "/".to_string())
            .await
            .unwrap(),
    );
    let crops: Arc<dyn Storage> = Arc::new(ObjectStorage::in_memory(CDN));
    let store = CropStore::new(sources, crops, PathCodec::new(&config));
    let renderer = Arc::new(ImageRenderer::new(RenderDefaults::from(config.as_ref())));
    let materializer = Materializer::new(config.clone(), store, renderer, None).unwrap();

    let state = Arc::new(AppState::new(config, Cropper::new(Arc::new(materializer))));
    let server = TestServer::new(routes::setup_routes(state.clone()))
        .expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}
