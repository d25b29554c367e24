#![deny(clippy::all)]

use crate::domain::{Ad, AdId, User, UserId};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{Result, TtlMs};

// Ports are the pluggable edges of the board: primary stores and the ad cache.

/// Port for the authoritative ad store.
///
/// `get_by_id`, `update` and `delete` return `Error::NotFound` for unknown ids.
#[async_trait]
pub trait AdRepository: Send + Sync + 'static {
    async fn get_all(&self) -> Result<Vec<Ad>>;
    async fn get_by_id(&self, id: AdId) -> Result<Ad>;
    async fn get_by_owner(&self, owner_id: UserId) -> Result<Vec<Ad>>;
    /// Inserts the ad, ignoring `ad.id`, and returns the stored row with its assigned id.
    async fn create(&self, ad: Ad) -> Result<Ad>;
    /// Replaces every field of the ad with the given id and returns the stored row.
    async fn update(&self, id: AdId, ad: Ad) -> Result<Ad>;
    async fn delete(&self, id: AdId) -> Result<()>;
}

/// Port for the authoritative user store.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn get_all(&self) -> Result<Vec<User>>;
    async fn get_by_id(&self, id: UserId) -> Result<User>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Returns `Error::Conflict` when the email is already taken.
    async fn create(&self, user: User) -> Result<User>;
    async fn update(&self, id: UserId, user: User) -> Result<User>;
    async fn delete(&self, id: UserId) -> Result<()>;
}

/// Port for a key-value cache with per-entry expiry (e.g. Redis, moka).
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Returns `Error::NotFound` on a miss, including expired entries.
    async fn get(&self, key: &str) -> Result<Bytes>;
    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()>;
    /// Idempotent; returns whether an entry was actually removed.
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn ping(&self) -> Result<()>;
    fn backend_name(&self) -> &'static str;
}
