pub mod moka_cache;
pub mod redis_cache;

pub use moka_cache::MokaCache;
pub use redis_cache::RedisCache;

use board::ports::CacheStore;
use shared::Result;
use shared::config::CacheBackend;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds the configured cache backend, or `None` when caching is disabled.
///
/// An unreachable Redis at startup is not fatal: the board runs uncached and
/// reports the cache as disabled.
pub async fn build_cache(
    backend: &CacheBackend,
    connect_timeout: Duration,
) -> Result<Option<Arc<dyn CacheStore>>> {
    match backend {
        CacheBackend::Disabled => {
            info!("Ad cache disabled");
            Ok(None)
        }
        CacheBackend::Memory(capacity) => {
            info!("Using in-process moka cache (capacity={})", capacity);
            Ok(Some(Arc::new(MokaCache::new(*capacity))))
        }
        CacheBackend::Redis(url) => match RedisCache::connect(url, connect_timeout).await {
            Ok(cache) => {
                info!("Connected to redis cache");
                Ok(Some(Arc::new(cache)))
            }
            Err(e) => {
                warn!(error = %e, "redis unavailable at startup, continuing without ad cache");
                Ok(None)
            }
        },
    }
}
