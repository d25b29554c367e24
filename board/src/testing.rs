//! In-memory doubles for the ports, shared by the unit tests.

use crate::ads::ad_key;
use crate::domain::{Ad, AdId, User, UserId};
use crate::ports::{AdRepository, CacheStore, UserRepository};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{Error, Result, TtlMs};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MemoryAds {
    rows: Mutex<BTreeMap<AdId, Ad>>,
    next_id: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    watched: Mutex<Option<Arc<FakeCache>>>,
    cached_at_write: Mutex<Vec<bool>>,
    vanish: AtomicBool,
}

impl MemoryAds {
    /// Number of `get_by_id` calls that reached the store.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of create/update/delete calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, id: AdId) -> Option<Ad> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    /// Records, at every update/delete, whether `cache` still held the ad.
    pub fn watch_cache(&self, cache: Arc<FakeCache>) {
        *self.watched.lock().unwrap() = Some(cache);
    }

    pub fn cached_at_write(&self) -> Vec<bool> {
        self.cached_at_write.lock().unwrap().clone()
    }

    /// The next update/delete finds its row removed by someone else.
    pub fn vanish_on_next_write(&self) {
        self.vanish.store(true, Ordering::SeqCst);
    }

    fn enter_write(&self, id: AdId) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(cache) = self.watched.lock().unwrap().as_ref() {
            self.cached_at_write
                .lock()
                .unwrap()
                .push(cache.contains(&ad_key(id)));
        }
        if self.vanish.swap(false, Ordering::SeqCst) {
            self.rows.lock().unwrap().remove(&id);
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AdRepository for MemoryAds {
    async fn get_all(&self) -> Result<Vec<Ad>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: AdId) -> Result<Ad> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.snapshot(id).ok_or(Error::NotFound)
    }

    async fn get_by_owner(&self, owner_id: UserId) -> Result<Vec<Ad>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|ad| ad.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, mut ad: Ad) -> Result<Ad> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        ad.id = self.next_id.fetch_add(1, Ordering::SeqCst) as AdId + 1;
        self.rows.lock().unwrap().insert(ad.id, ad.clone());
        Ok(ad)
    }

    async fn update(&self, id: AdId, mut ad: Ad) -> Result<Ad> {
        self.enter_write(id)?;
        let mut rows = self.rows.lock().unwrap();
        let slot = rows.get_mut(&id).ok_or(Error::NotFound)?;
        ad.id = id;
        *slot = ad.clone();
        Ok(ad)
    }

    async fn delete(&self, id: AdId) -> Result<()> {
        self.enter_write(id)?;
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<BTreeMap<UserId, User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn get_all(&self) -> Result<Vec<User>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, mut user: User) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.email == user.email) {
            return Err(Error::Conflict(format!("email {} is taken", user.email)));
        }
        user.id = rows.keys().max().copied().unwrap_or(0) + 1;
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, mut user: User) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.id != id && u.email == user.email) {
            return Err(Error::Conflict(format!("email {} is taken", user.email)));
        }
        let slot = rows.get_mut(&id).ok_or(Error::NotFound)?;
        user.id = id;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }
}

/// Cache double that can be switched into a failing or slow mode.
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, (Bytes, TtlMs)>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FakeCache {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            (Bytes::copy_from_slice(value), TtlMs(60_000)),
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn last_ttl(&self, key: &str) -> Option<TtlMs> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    async fn enter(&self) -> Result<()> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Internal("cache unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FakeCache {
    async fn get(&self, key: &str) -> Result<Bytes> {
        self.enter().await?;
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone())
            .ok_or(Error::NotFound)
    }

    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()> {
        self.enter().await?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.enter().await?;
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn ping(&self) -> Result<()> {
        self.enter().await
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}
