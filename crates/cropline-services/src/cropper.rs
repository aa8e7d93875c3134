//! Application-facing crop API.

use std::sync::Arc;

use cropline_core::{CropError, CropOption, CropSpec, CroplineConfig, PathCodec, SourceRef};
use cropline_processing::{CropRenderer, ImageRenderer, RenderDefaults};
use cropline_storage::{create_storage, CropStore, StorageError};
use maud::html;

use crate::materializer::Materializer;
use crate::resolution_cache::{cache_key, LruResolutionCache, ResolutionCache};

/// A generated crop URL and its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropUrl {
    /// Encoded path, relative to the URL prefix
    pub path: String,
    pub token: Option<String>,
    pub url: String,
}

/// What `delete` removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub source: String,
    pub crops: Vec<String>,
}

#[derive(Clone)]
pub struct Cropper {
    materializer: Arc<Materializer>,
}

impl Cropper {
    pub fn new(materializer: Arc<Materializer>) -> Self {
        Cropper { materializer }
    }

    /// Wire disks, renderer and cache from configuration.
    pub async fn from_config(config: Arc<CroplineConfig>) -> anyhow::Result<Self> {
        let sources = create_storage(&config.src_disk).await?;
        let crops = create_storage(&config.crops_disk).await?;
        let store = CropStore::new(sources, crops, PathCodec::new(&config));
        let renderer: Arc<dyn CropRenderer> =
            Arc::new(ImageRenderer::new(RenderDefaults::from(config.as_ref())));
        let cache: Option<Arc<dyn ResolutionCache>> = if config.cache.enabled {
            Some(Arc::new(LruResolutionCache::new(config.cache.capacity)))
        } else {
            None
        };

        tracing::info!(
            src_backend = %config.src_disk.backend,
            crops_backend = %config.crops_disk.backend,
            signed = config.signed,
            cache_enabled = config.cache.enabled,
            "Cropper initialized"
        );

        let materializer = Materializer::new(config, store, renderer, cache)?;
        Ok(Cropper::new(Arc::new(materializer)))
    }

    pub fn materializer(&self) -> &Arc<Materializer> {
        &self.materializer
    }

    fn codec(&self) -> &PathCodec {
        self.materializer.codec()
    }

    fn store(&self) -> &CropStore {
        self.materializer.store()
    }

    /// Accepts `photos/a.jpg`, `/uploads/photos/a.jpg` or a full URL.
    fn source_ref(&self, src: &str) -> Result<SourceRef, CropError> {
        SourceRef::parse(&self.codec().relative_path(src))
    }

    /// Signed URL of a crop of `src`.
    pub fn url(
        &self,
        src: &str,
        width: Option<u32>,
        height: Option<u32>,
        options: Vec<CropOption>,
    ) -> Result<CropUrl, CropError> {
        let source = self.source_ref(src)?;
        let spec = CropSpec {
            width,
            height,
            options,
        };
        let encoded = self.codec().encode(&source, &spec)?;
        let token = self
            .materializer
            .signer()
            .map(|signer| signer.token(encoded.as_str()));
        let url = self.codec().url_for(&encoded, token.as_deref());

        Ok(CropUrl {
            path: encoded.into_string(),
            token,
            url,
        })
    }

    /// `<img>` tag pointing at a crop of `src`.
    pub fn tag(
        &self,
        src: &str,
        width: Option<u32>,
        height: Option<u32>,
        options: Vec<CropOption>,
    ) -> Result<String, CropError> {
        let crop = self.url(src, width, height, options)?;
        Ok(html! { img src=(crop.url); }.into_string())
    }

    /// Materialize a crop and return its crop key.
    pub async fn render(&self, path: &str) -> Result<String, CropError> {
        self.materializer.render(path).await
    }

    /// Materialize a crop and return the URL it can be fetched from.
    pub async fn render_to_actual_path(&self, path: &str) -> Result<String, CropError> {
        self.materializer.render_and_resolve(path).await
    }

    /// Delete a source and every crop derived from it.
    ///
    /// Both deletions run to completion; if either fails the call fails and
    /// the error says what was and was not removed.
    pub async fn delete(&self, src: &str) -> Result<DeleteReport, CropError> {
        let source = self.source_ref(src)?;

        let (source_result, crops_result) = tokio::join!(
            self.store().delete_source(&source),
            self.store().delete_all_crops_of(&source)
        );

        if let Ok(keys) = &crops_result {
            self.forget(keys).await;
        }

        match (source_result, crops_result) {
            (Ok(()), Ok(crops)) => {
                tracing::info!(source = %source, crops = crops.len(), "Deleted source and crops");
                Ok(DeleteReport {
                    source: source.to_string(),
                    crops,
                })
            }
            (Err(e), Ok(crops)) => Err(partial_failure(
                &source,
                format!("source not deleted ({}); {} crops deleted", e, crops.len()),
            )),
            (Ok(()), Err(e)) => Err(partial_failure(
                &source,
                format!("source deleted; crops not deleted ({})", e),
            )),
            (Err(source_err), Err(crops_err)) => Err(partial_failure(
                &source,
                format!(
                    "source not deleted ({}); crops not deleted ({})",
                    source_err, crops_err
                ),
            )),
        }
    }

    /// Delete every crop of `src`, keeping the source.
    pub async fn reset(&self, src: &str) -> Result<Vec<String>, CropError> {
        let source = self.source_ref(src)?;
        let crops = self.store().delete_all_crops_of(&source).await?;
        self.forget(&crops).await;
        Ok(crops)
    }

    async fn forget(&self, crop_keys: &[String]) {
        if let Some(cache) = self.materializer.cache() {
            for key in crop_keys {
                cache.forget(&cache_key(key)).await;
            }
        }
    }
}

fn partial_failure(source: &SourceRef, detail: String) -> CropError {
    let err = StorageError::DeleteFailed(format!("{}: {}", source, detail));
    tracing::error!(source = %source, error = %err, "Delete incomplete");
    err.into()
}
