use async_trait::async_trait;
use board::ports::CacheStore;
use bytes::Bytes;
use redis::Client;
use redis::aio::ConnectionManager;
use shared::{Error, Result, TtlMs};
use std::time::Duration;

fn redis_error(op: &str, err: redis::RedisError) -> Error {
    Error::Internal(format!("redis {} failed: {}", op, err))
}

/// Shared Redis cache. The connection manager reconnects on its own, and each
/// call works on a cheap clone of it.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::open(url).map_err(|e| redis_error("open", e))?;
        let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::Internal(format!("redis connect timed out after {:?}", timeout)))?
            .map_err(|e| redis_error("connect", e))?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Bytes> {
        let mut con = self.manager.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(|e| redis_error("GET", e))?;

        value.map(Bytes::from).ok_or(Error::NotFound)
    }

    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()> {
        let mut con = self.manager.clone();
        // PX rejects zero
        let ttl_ms = ttl.0.max(1);
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut con)
            .await
            .map_err(|e| redis_error("SET", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut con = self.manager.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(|e| redis_error("DEL", e))?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<()> {
        let mut con = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(|e| redis_error("PING", e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
