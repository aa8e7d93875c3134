//! Resolution cache
//!
//! Remembers where the artifact for a request path lives so repeat requests
//! can skip the storage round trips. Entries are hints: a missing or stale
//! entry only costs latency.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const KEY_PREFIX: &str = "cropline:";

/// Cache key for an encoded crop path.
pub fn cache_key(crop_path: &str) -> String {
    format!("{}{}", KEY_PREFIX, crop_path.trim_start_matches('/'))
}

/// Key-value store for resolved locations. Other writers may share it.
#[async_trait]
pub trait ResolutionCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn put(&self, key: &str, location: &str, ttl: Duration);

    async fn forget(&self, key: &str);
}

/// In-process cache bounded by entry count, with per-entry expiry.
pub struct LruResolutionCache {
    entries: Mutex<LruCache<String, (String, Instant)>>,
}

impl LruResolutionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResolutionCache for LruResolutionCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((location, expires_at)) if *expires_at > Instant::now() => Some(location.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, location: &str, ttl: Duration) {
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            return;
        };
        self.entries
            .lock()
            .await
            .put(key.to_string(), (location.to_string(), expires_at));
    }

    async fn forget(&self, key: &str) {
        self.entries.lock().await.pop(key);
    }
}
