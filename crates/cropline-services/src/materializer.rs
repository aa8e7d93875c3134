//! Crop materialization
//!
//! `handle` walks one request through
//! received -> token checked -> (exists | rendered and written) -> served or redirected.
//! Concurrent requests for the same path may race to render; rendering is
//! deterministic and writes are idempotent, so the race only costs duplicate
//! work. The optional single-flight guard removes that duplicate work within
//! one process.

use std::sync::Arc;

use bytes::Bytes;
use cropline_core::{
    content_type_for_extension, CropError, CropSpec, CroplineConfig, PathCodec, SourceRef,
    UrlSigner,
};
use cropline_processing::CropRenderer;
use cropline_storage::CropStore;

use crate::resolution_cache::{cache_key, ResolutionCache};
use crate::single_flight::SingleFlight;

/// Outcome of a crop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Crops live on a local disk: serve the bytes directly.
    Inline {
        bytes: Bytes,
        content_type: &'static str,
        /// Crop key the bytes were read from
        location: String,
    },
    /// Crops live on a remote disk: permanently redirect to the public URL.
    Redirect { url: String },
}

pub struct Materializer {
    config: Arc<CroplineConfig>,
    codec: PathCodec,
    signer: Option<UrlSigner>,
    store: CropStore,
    renderer: Arc<dyn CropRenderer>,
    cache: Option<Arc<dyn ResolutionCache>>,
    flights: Option<SingleFlight>,
}

impl Materializer {
    pub fn new(
        config: Arc<CroplineConfig>,
        store: CropStore,
        renderer: Arc<dyn CropRenderer>,
        cache: Option<Arc<dyn ResolutionCache>>,
    ) -> Result<Self, CropError> {
        let signer = if config.signed {
            if config.secret.is_empty() {
                tracing::warn!("Signed URLs are enabled with an empty secret");
            }
            Some(UrlSigner::new(&config.secret)?)
        } else {
            None
        };
        let flights = config.single_flight.then(SingleFlight::new);
        let cache = cache.filter(|_| config.cache.enabled);

        Ok(Materializer {
            codec: store.codec().clone(),
            config,
            signer,
            store,
            renderer,
            cache,
            flights,
        })
    }

    pub fn config(&self) -> &CroplineConfig {
        &self.config
    }

    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    pub fn signer(&self) -> Option<&UrlSigner> {
        self.signer.as_ref()
    }

    pub fn store(&self) -> &CropStore {
        &self.store
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResolutionCache>> {
        self.cache.as_ref()
    }

    /// Answer a crop request for a raw request path and its `token` query value.
    pub async fn handle(
        &self,
        raw_path: &str,
        token: Option<&str>,
    ) -> Result<Materialized, CropError> {
        let path = self.codec.request_path(raw_path)?;
        let (source, spec) = self.codec.decode(&path)?;

        if let Some(signer) = &self.signer {
            let valid = token.is_some_and(|t| signer.verify(&path, t));
            if !valid {
                tracing::warn!(path = %path, token_present = token.is_some(), "Rejected crop token");
                return Err(CropError::TokenMismatch);
            }
        }

        if let Some(hit) = self.cached(&path, &source, &spec).await {
            return Ok(hit);
        }

        let (location, rendered) = self.materialize(&path, &source, &spec).await?;
        let outcome = self
            .respond(&path, location, &source, &spec, rendered)
            .await?;

        if let Some(cache) = &self.cache {
            let value = match &outcome {
                Materialized::Inline { location, .. } => location.clone(),
                Materialized::Redirect { url } => url.clone(),
            };
            cache
                .put(&cache_key(&path), &value, self.config.cache.ttl)
                .await;
        }

        Ok(outcome)
    }

    /// Materialize a crop for a trusted caller and return its public URL.
    ///
    /// Accepts the encoded path in any form `PathCodec::relative_path` understands.
    pub async fn render_and_resolve(&self, path: &str) -> Result<String, CropError> {
        let location = self.render(path).await?;
        Ok(self.store.resolve_url(&location))
    }

    /// Materialize a crop for a trusted caller and return its crop key.
    pub async fn render(&self, path: &str) -> Result<String, CropError> {
        let path = self.codec.relative_path(path);
        let (source, spec) = self.codec.decode(&path)?;
        let (location, _) = self.materialize(&path, &source, &spec).await?;
        Ok(location)
    }

    /// Make sure the artifact for `path` exists, rendering it if needed.
    ///
    /// Returns its location and, when rendered by this call, its bytes.
    async fn materialize(
        &self,
        path: &str,
        source: &SourceRef,
        spec: &CropSpec,
    ) -> Result<(String, Option<Bytes>), CropError> {
        let _guard = match &self.flights {
            Some(flights) => Some(flights.acquire(path).await),
            None => None,
        };

        if self.store.exists(path).await? {
            tracing::debug!(path = %path, "Crop already exists");
            return Ok((path.to_string(), None));
        }

        if let Some(limit) = self.config.max_crops {
            let existing = self.store.crops_of(source).await?.len();
            if existing >= limit {
                tracing::warn!(source = %source, limit, "Crop limit reached");
                return Err(CropError::CropLimitReached {
                    source_path: source.to_string(),
                    limit,
                });
            }
        }

        let source_bytes = self.store.read_source(source).await.map_err(|e| {
            if e.is_not_found() {
                CropError::SourceNotFound(source.to_string())
            } else {
                e.into()
            }
        })?;

        let start = std::time::Instant::now();
        let renderer = self.renderer.clone();
        let render_spec = spec.clone();
        let extension = source.extension().to_string();
        let rendered = tokio::task::spawn_blocking(move || {
            renderer.render(&source_bytes, &render_spec, &extension)
        })
        .await
        .map_err(|e| CropError::Render(format!("render task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!(path = %path, error = %e, "Render failed");
            CropError::from(e)
        })?;

        let content_type = content_type_for_extension(spec.output_extension(source.extension()));
        let location = self
            .store
            .write(path, rendered.clone(), content_type)
            .await?;

        tracing::info!(
            path = %path,
            backend = %self.store.crops_backend(),
            size_bytes = rendered.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Crop materialized"
        );

        Ok((location, Some(rendered)))
    }

    /// Build the response for a materialized crop.
    ///
    /// A local crop removed between the existence check and the read is
    /// materialized once more.
    async fn respond(
        &self,
        path: &str,
        mut location: String,
        source: &SourceRef,
        spec: &CropSpec,
        rendered: Option<Bytes>,
    ) -> Result<Materialized, CropError> {
        if self.store.crops_are_remote() {
            return Ok(Materialized::Redirect {
                url: self.store.resolve_url(&location),
            });
        }

        let bytes = match rendered {
            Some(bytes) => bytes,
            None => match self.store.read(&location).await {
                Ok(bytes) => bytes,
                Err(e) if e.is_not_found() => {
                    tracing::debug!(path = %path, "Crop vanished before it was read");
                    let (again, rendered) = self.materialize(path, source, spec).await?;
                    location = again;
                    match rendered {
                        Some(bytes) => bytes,
                        None => self.store.read(&location).await?,
                    }
                }
                Err(e) => return Err(e.into()),
            },
        };

        Ok(Materialized::Inline {
            bytes,
            content_type: content_type_for_extension(spec.output_extension(source.extension())),
            location,
        })
    }

    /// Serve from a cache hit, or `None` to fall back to the normal path.
    async fn cached(&self, path: &str, source: &SourceRef, spec: &CropSpec) -> Option<Materialized> {
        let cache = self.cache.as_ref()?;
        let value = cache.get(&cache_key(path)).await?;

        if self.store.crops_are_remote() {
            tracing::debug!(path = %path, "Resolution cache hit");
            return Some(Materialized::Redirect { url: value });
        }

        match self.store.read(&value).await {
            Ok(bytes) => {
                tracing::debug!(path = %path, "Resolution cache hit");
                Some(Materialized::Inline {
                    bytes,
                    content_type: content_type_for_extension(
                        spec.output_extension(source.extension()),
                    ),
                    location: value,
                })
            }
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Stale resolution cache entry");
                cache.forget(&cache_key(path)).await;
                None
            }
        }
    }
}
