use async_trait::async_trait;
use board::ports::CacheStore;
use bytes::Bytes;
use moka::Expiry;
use moka::future::Cache;
use shared::{Error, Result, TtlMs};
use std::fmt::Debug;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry {
    value: Bytes,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    // Overwrites restart the clock with the new entry's TTL
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process cache backed by moka, bounded by entry count.
///
/// Lock-free and safe to share across request tasks. Contents are lost on
/// restart and not shared between instances.
pub struct MokaCache {
    cache: Cache<String, Entry>,
}

impl MokaCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .name("board-ads")
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MokaCache {
    async fn get(&self, key: &str) -> Result<Bytes> {
        match self.cache.get(key).await {
            Some(entry) => Ok(entry.value),
            None => Err(Error::NotFound), // absent or expired
        }
    }

    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()> {
        let entry = Entry {
            value,
            ttl: ttl.as_duration(),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "moka"
    }
}

impl Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
