//! Configuration module
//!
//! `CroplineConfig` is built once at startup (usually from the environment)
//! and shared read-only by every component afterwards.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const CACHE_TTL_SECS: u64 = 60 * 60 * 24 * 30;
const CACHE_CAPACITY: usize = 10_000;
const JPEG_QUALITY: u8 = 95;
const LOCAL_ROOT: &str = "./public";

/// Where one family of images (sources or crops) lives.
#[derive(Clone, Debug)]
pub struct DiskConfig {
    pub backend: StorageBackend,
    pub local_path: String,
    pub base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_prefix: Option<String>,
}

impl DiskConfig {
    pub fn local(path: impl Into<String>, base_url: impl Into<String>) -> Self {
        DiskConfig {
            backend: StorageBackend::Local,
            local_path: path.into(),
            base_url: base_url.into(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_prefix: None,
        }
    }

    /// Read `CROPLINE_{NAME}_*` variables, falling back to the shared `CROPLINE_S3_*` ones.
    fn from_env(name: &str) -> Result<Self, anyhow::Error> {
        let var = |suffix: &str| env::var(format!("CROPLINE_{}_{}", name, suffix)).ok();
        let shared = |suffix: &str| env::var(format!("CROPLINE_S3_{}", suffix)).ok();

        let backend = match var("DISK") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Local,
        };

        Ok(DiskConfig {
            backend,
            local_path: var("PATH").unwrap_or_else(|| LOCAL_ROOT.to_string()),
            base_url: var("URL").unwrap_or_else(|| "/".to_string()),
            s3_bucket: var("S3_BUCKET").or_else(|| shared("BUCKET")),
            s3_region: var("S3_REGION")
                .or_else(|| shared("REGION"))
                .or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: var("S3_ENDPOINT").or_else(|| shared("ENDPOINT")),
            s3_prefix: var("S3_PREFIX"),
        })
    }

    fn validate(&self, name: &str) -> Result<(), anyhow::Error> {
        if self.backend.is_remote() {
            if self.s3_bucket.as_deref().map_or(true, str::is_empty) {
                return Err(anyhow::anyhow!("{} disk is s3 but no bucket is configured", name));
            }
            if self.s3_region.as_deref().map_or(true, str::is_empty) {
                return Err(anyhow::anyhow!("{} disk is s3 but no region is configured", name));
            }
        } else if self.local_path.trim().is_empty() {
            return Err(anyhow::anyhow!("{} disk is local but has no path", name));
        }
        Ok(())
    }
}

/// Resolution cache behaviour.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: false,
            ttl: Duration::from_secs(CACHE_TTL_SECS),
            capacity: CACHE_CAPACITY,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct CroplineConfig {
    /// HMAC key for signing tokens.
    pub secret: String,
    /// Whether request tokens are enforced at all.
    pub signed: bool,
    /// Unknown option keys fail decoding instead of being ignored.
    pub strict: bool,
    /// Public path under which crops are requested, e.g. `/uploads/`.
    pub url_prefix: String,
    /// Scheme and host prepended to generated URLs.
    pub url_host: Option<String>,
    pub src_disk: DiskConfig,
    pub crops_disk: DiskConfig,
    pub cache: CacheConfig,
    pub jpeg_quality: u8,
    pub interlace: bool,
    pub upscale: bool,
    /// Maximum number of crops kept per source. `None` = unlimited.
    pub max_crops: Option<usize>,
    /// Coalesce concurrent renders of the same crop in this process.
    pub single_flight: bool,
    pub server_port: u16,
    pub environment: String,
}

impl Default for CroplineConfig {
    fn default() -> Self {
        CroplineConfig {
            secret: String::new(),
            signed: true,
            strict: false,
            url_prefix: "/".to_string(),
            url_host: None,
            src_disk: DiskConfig::local(LOCAL_ROOT, "/"),
            crops_disk: DiskConfig::local(LOCAL_ROOT, "/"),
            cache: CacheConfig::default(),
            jpeg_quality: JPEG_QUALITY,
            interlace: true,
            upscale: false,
            max_crops: None,
            single_flight: true,
            server_port: SERVER_PORT,
            environment: "development".to_string(),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl CroplineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cache = CacheConfig {
            enabled: env_bool("CROPLINE_CACHE_ENABLED", false),
            ttl: Duration::from_secs(
                env::var("CROPLINE_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| CACHE_TTL_SECS.to_string())
                    .parse()
                    .unwrap_or(CACHE_TTL_SECS),
            ),
            capacity: env::var("CROPLINE_CACHE_CAPACITY")
                .unwrap_or_else(|_| CACHE_CAPACITY.to_string())
                .parse()
                .unwrap_or(CACHE_CAPACITY),
        };

        let config = CroplineConfig {
            secret: env::var("CROPLINE_SECRET").unwrap_or_default(),
            signed: env_bool("CROPLINE_SIGNED", true),
            strict: env_bool("CROPLINE_STRICT", false),
            url_prefix: env::var("CROPLINE_URL_PREFIX").unwrap_or_else(|_| "/".to_string()),
            url_host: env::var("CROPLINE_URL_HOST").ok().filter(|h| !h.is_empty()),
            src_disk: DiskConfig::from_env("SRC")?,
            crops_disk: DiskConfig::from_env("CROPS")?,
            cache,
            jpeg_quality: env::var("CROPLINE_JPEG_QUALITY")
                .unwrap_or_else(|_| JPEG_QUALITY.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CROPLINE_JPEG_QUALITY must be 0-100"))?,
            interlace: env_bool("CROPLINE_INTERLACE", true),
            upscale: env_bool("CROPLINE_UPSCALE", false),
            max_crops: env::var("CROPLINE_MAX_CROPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0),
            single_flight: env_bool("CROPLINE_SINGLE_FLIGHT", true),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.signed && self.secret.is_empty() && self.is_production() {
            return Err(anyhow::anyhow!(
                "CROPLINE_SECRET must be set when signed URLs are enabled in production"
            ));
        }
        if self.jpeg_quality > 100 {
            return Err(anyhow::anyhow!("jpeg_quality must be between 0 and 100"));
        }
        if !self.url_prefix.starts_with('/') || !self.url_prefix.ends_with('/') {
            return Err(anyhow::anyhow!(
                "url_prefix must start and end with '/', got {}",
                self.url_prefix
            ));
        }
        if self.cache.enabled && (self.cache.ttl.is_zero() || self.cache.capacity == 0) {
            return Err(anyhow::anyhow!(
                "cache ttl and capacity must be positive when the cache is enabled"
            ));
        }
        self.src_disk.validate("src")?;
        self.crops_disk.validate("crops")?;
        Ok(())
    }
}
