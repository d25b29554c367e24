use crate::domain::{Ad, AdId};
use crate::ports::CacheStore;
use bytes::Bytes;
use shared::{Error, Result, TtlMs};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_AD_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

pub fn ad_key(id: AdId) -> String {
    format!("ad:{}", id)
}

/// Best-effort ad snapshot cache in front of a [`CacheStore`].
///
/// None of the methods fail: backend errors, timeouts and undecodable entries
/// are logged and reported as a miss, so reads and writes keep working while
/// the cache is down.
#[derive(Clone)]
pub struct AdCache {
    store: Arc<dyn CacheStore>,
    ttl: TtlMs,
    timeout: Duration,
}

impl AdCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            store,
            ttl: TtlMs::from_duration(ttl),
            timeout,
        }
    }

    pub fn with_defaults(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, DEFAULT_AD_TTL, DEFAULT_CACHE_TIMEOUT)
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn lookup(&self, id: AdId) -> Option<Ad> {
        let key = ad_key(id);

        let bytes = match self.bounded(self.store.get(&key)).await {
            Ok(bytes) => bytes,
            Err(Error::NotFound) => {
                debug!(key = %key, "ad cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "ad cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_slice::<Ad>(&bytes) {
            Ok(ad) if ad.id == id => Some(ad),
            Ok(ad) => {
                warn!(key = %key, cached_id = ad.id, "cached ad has wrong identity, evicting");
                self.forget(id).await;
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cached ad is not decodable, evicting");
                self.forget(id).await;
                None
            }
        }
    }

    pub async fn remember(&self, ad: &Ad) {
        let key = ad_key(ad.id);

        let payload = match serde_json::to_vec(ad) {
            Ok(payload) => Bytes::from(payload),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to serialize ad for cache");
                return;
            }
        };

        if let Err(e) = self.bounded(self.store.put(&key, payload, self.ttl)).await {
            warn!(key = %key, error = %e, "failed to populate ad cache");
        }
    }

    pub async fn forget(&self, id: AdId) {
        let key = ad_key(id);

        match self.bounded(self.store.delete(&key)).await {
            Ok(removed) => debug!(key = %key, removed, "ad cache entry invalidated"),
            Err(e) => warn!(
                key = %key,
                error = %e,
                "failed to invalidate ad cache entry, it may stay stale until expiry"
            ),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        self.bounded(self.store.ping()).await
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Internal(format!(
                "{} cache call timed out after {:?}",
                self.store.backend_name(),
                self.timeout
            ))),
        }
    }
}
