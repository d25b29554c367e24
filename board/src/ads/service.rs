use crate::ads::cache::AdCache;
use crate::auth::require_identity;
use crate::domain::{Ad, AdDraft, AdId, Identity, UserId};
use crate::ports::AdRepository;
use crate::validation::{AdRules, ensure_id};
use shared::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHealth {
    Up,
    Down,
    Disabled,
}

impl CacheHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheHealth::Up => "up",
            CacheHealth::Down => "down",
            CacheHealth::Disabled => "disabled",
        }
    }
}

/// Ad use cases over the primary store with an optional read-through cache.
///
/// Reads go cache first and fall back to the store. Writes hit the store and
/// drop the cached snapshot only after the store call succeeded. A reader that
/// loaded the old row just before an update commits can still repopulate the
/// cache with it after the invalidation; that copy lives until the TTL expires
/// or the next write to the same ad.
#[derive(Clone)]
pub struct AdService {
    repository: Arc<dyn AdRepository>,
    cache: Option<AdCache>,
    rules: AdRules,
}

impl AdService {
    pub fn new(repository: Arc<dyn AdRepository>, rules: AdRules) -> Self {
        Self {
            repository,
            cache: None,
            rules,
        }
    }

    pub fn with_cache(repository: Arc<dyn AdRepository>, cache: AdCache, rules: AdRules) -> Self {
        Self {
            repository,
            cache: Some(cache),
            rules,
        }
    }

    pub fn rules(&self) -> AdRules {
        self.rules
    }

    pub async fn get_all(&self) -> Result<Vec<Ad>> {
        self.repository.get_all().await
    }

    pub async fn get_by_owner(&self, owner_id: UserId) -> Result<Vec<Ad>> {
        ensure_id(owner_id)?;
        self.repository.get_by_owner(owner_id).await
    }

    pub async fn get_by_id(&self, id: AdId) -> Result<Ad> {
        ensure_id(id)?;

        let cached = match &self.cache {
            Some(cache) => cache.lookup(id).await,
            None => None,
        };
        if let Some(ad) = cached {
            debug!(ad_id = id, "ad served from cache");
            return Ok(ad);
        }

        let ad = self.repository.get_by_id(id).await?;

        if let Some(cache) = &self.cache {
            cache.remember(&ad).await;
        }
        Ok(ad)
    }

    pub async fn create(&self, caller: Option<&Identity>, draft: AdDraft) -> Result<Ad> {
        let caller = require_identity(caller)?;
        self.rules.check(&draft)?;

        let ad = self.repository.create(draft.into_ad(caller.user_id)).await?;

        info!("CREATE_AD: id={}, owner={}", ad.id, ad.owner_id);
        Ok(ad)
    }

    pub async fn update(&self, caller: Option<&Identity>, id: AdId, draft: AdDraft) -> Result<Ad> {
        let caller = require_identity(caller)?;
        ensure_id(id)?;
        self.ensure_owner(caller, id).await?;
        self.rules.check(&draft)?;

        let ad = self
            .repository
            .update(id, draft.into_ad(caller.user_id))
            .await?;
        self.invalidate(id).await;

        info!("UPDATE_AD: id={}, owner={}", ad.id, ad.owner_id);
        Ok(ad)
    }

    pub async fn delete(&self, caller: Option<&Identity>, id: AdId) -> Result<()> {
        let caller = require_identity(caller)?;
        ensure_id(id)?;
        self.ensure_owner(caller, id).await?;

        self.repository.delete(id).await?;
        self.invalidate(id).await;

        info!("DELETE_AD: id={}, requested_by={}", id, caller.user_id);
        Ok(())
    }

    pub async fn cache_health(&self) -> CacheHealth {
        match &self.cache {
            None => CacheHealth::Disabled,
            Some(cache) => match cache.ping().await {
                Ok(()) => CacheHealth::Up,
                Err(_) => CacheHealth::Down,
            },
        }
    }

    // Ownership is always decided on the authoritative row.
    async fn ensure_owner(&self, caller: &Identity, id: AdId) -> Result<()> {
        let current = self.repository.get_by_id(id).await?;
        if current.owner_id != caller.user_id {
            info!(
                "FORBIDDEN_AD_WRITE: id={}, owner={}, requested_by={}",
                id, current.owner_id, caller.user_id
            );
            return Err(Error::Forbidden);
        }
        Ok(())
    }

    async fn invalidate(&self, id: AdId) {
        if let Some(cache) = &self.cache {
            cache.forget(id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::cache::ad_key;
    use crate::testing::{FakeCache, MemoryAds};

    struct Fixture {
        store: Arc<MemoryAds>,
        cache: Arc<FakeCache>,
        service: AdService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryAds::default());
        let cache = Arc::new(FakeCache::default());
        let service = AdService::with_cache(
            store.clone(),
            AdCache::with_defaults(cache.clone()),
            AdRules::default(),
        );
        Fixture {
            store,
            cache,
            service,
        }
    }

    fn owner(id: UserId) -> Identity {
        Identity::new(id)
    }

    async fn seed(f: &Fixture) -> Ad {
        f.service
            .create(Some(&owner(1)), AdDraft::new("Phone", "barely used", 500))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cold_read_matches_store() {
        let f = fixture();
        let created = seed(&f).await;

        let read = f.service.get_by_id(created.id).await.unwrap();

        assert_eq!(read, created);
        assert_eq!(f.store.snapshot(created.id), Some(read));
        assert!(f.cache.contains(&ad_key(created.id)));
    }

    #[tokio::test]
    async fn warm_read_skips_store() {
        let f = fixture();
        let created = seed(&f).await;

        f.service.get_by_id(created.id).await.unwrap();
        f.service.get_by_id(created.id).await.unwrap();
        f.service.get_by_id(created.id).await.unwrap();

        assert_eq!(f.store.reads(), 1);
    }

    #[tokio::test]
    async fn read_rejects_non_positive_id() {
        let f = fixture();
        assert!(matches!(
            f.service.get_by_id(0).await,
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(f.store.reads(), 0);
    }

    #[tokio::test]
    async fn read_after_update_sees_new_payload() {
        let f = fixture();
        let created = seed(&f).await;
        f.service.get_by_id(created.id).await.unwrap();

        let updated = f
            .service
            .update(
                Some(&owner(1)),
                created.id,
                AdDraft::new("Phone", "barely used", 600),
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 600);
        assert!(!f.cache.contains(&ad_key(created.id)));

        let read = f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(read.price, 600);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let f = fixture();
        let created = seed(&f).await;
        f.service.get_by_id(created.id).await.unwrap();
        let writes = f.store.writes();

        let result = f.service.delete(Some(&owner(2)), created.id).await;

        assert!(matches!(result, Err(Error::Forbidden)));
        assert_eq!(f.store.writes(), writes);
        assert_eq!(f.store.snapshot(created.id), Some(created.clone()));
        assert!(f.cache.contains(&ad_key(created.id)));
    }

    #[tokio::test]
    async fn non_owner_cannot_update() {
        let f = fixture();
        let created = seed(&f).await;

        let result = f
            .service
            .update(Some(&owner(2)), created.id, AdDraft::new("Mine now", "", 1))
            .await;

        assert!(matches!(result, Err(Error::Forbidden)));
        assert_eq!(f.store.snapshot(created.id), Some(created));
    }

    #[tokio::test]
    async fn writes_to_missing_ad_are_not_found() {
        let f = fixture();

        let update = f
            .service
            .update(Some(&owner(1)), 42, AdDraft::new("Phone", "", 1))
            .await;
        let delete = f.service.delete(Some(&owner(1)), 42).await;

        assert!(matches!(update, Err(Error::NotFound)));
        assert!(matches!(delete, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn writes_require_identity() {
        let f = fixture();
        let created = seed(&f).await;

        assert!(matches!(
            f.service.create(None, AdDraft::new("Phone", "", 1)).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            f.service
                .update(None, created.id, AdDraft::new("Phone", "", 1))
                .await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            f.service.delete(None, created.id).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_store_write() {
        let store = Arc::new(MemoryAds::default());
        let service = AdService::new(store.clone(), AdRules::with_min_price(1));

        let result = service
            .create(Some(&owner(1)), AdDraft::new("Chair", "", 0))
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = service
            .create(Some(&owner(1)), AdDraft::new("  ", "", 10))
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn update_with_invalid_payload_keeps_row() {
        let f = fixture();
        let created = seed(&f).await;
        f.service.get_by_id(created.id).await.unwrap();

        let result = f
            .service
            .update(Some(&owner(1)), created.id, AdDraft::new("Phone", "", -5))
            .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(f.store.snapshot(created.id), Some(created.clone()));
        assert!(f.cache.contains(&ad_key(created.id)));
    }

    #[tokio::test]
    async fn cache_entry_outlives_the_store_write() {
        let f = fixture();
        let created = seed(&f).await;
        f.store.watch_cache(f.cache.clone());

        f.service.get_by_id(created.id).await.unwrap();
        f.service
            .update(Some(&owner(1)), created.id, AdDraft::new("Phone", "", 450))
            .await
            .unwrap();
        assert!(!f.cache.contains(&ad_key(created.id)));

        f.service.get_by_id(created.id).await.unwrap();
        f.service
            .delete(Some(&owner(1)), created.id)
            .await
            .unwrap();
        assert!(!f.cache.contains(&ad_key(created.id)));

        // Still cached when each write reached the store
        assert_eq!(f.store.cached_at_write(), vec![true, true]);
    }

    #[tokio::test]
    async fn failed_store_write_leaves_cache_alone() {
        let f = fixture();
        let first = seed(&f).await;
        let second = seed(&f).await;
        f.service.get_by_id(first.id).await.unwrap();
        f.service.get_by_id(second.id).await.unwrap();

        // Rows vanish between the owner check and the write
        f.store.vanish_on_next_write();
        let update = f
            .service
            .update(Some(&owner(1)), first.id, AdDraft::new("Phone", "", 450))
            .await;
        f.store.vanish_on_next_write();
        let delete = f.service.delete(Some(&owner(1)), second.id).await;

        assert!(matches!(update, Err(Error::NotFound)));
        assert!(matches!(delete, Err(Error::NotFound)));
        assert!(f.cache.contains(&ad_key(first.id)));
        assert!(f.cache.contains(&ad_key(second.id)));
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let f = fixture();
        let created = seed(&f).await;
        assert_eq!(created.owner_id, 1);
        assert_eq!(created.price, 500);

        let read = f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(read.price, 500);

        let updated = f
            .service
            .update(
                Some(&owner(1)),
                created.id,
                AdDraft::new("Phone", "barely used", 600),
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 600);
        assert_eq!(f.service.get_by_id(created.id).await.unwrap().price, 600);

        assert!(matches!(
            f.service.delete(Some(&owner(2)), created.id).await,
            Err(Error::Forbidden)
        ));
        f.service.delete(Some(&owner(1)), created.id).await.unwrap();

        assert!(matches!(
            f.service.get_by_id(created.id).await,
            Err(Error::NotFound)
        ));
        assert!(!f.cache.contains(&ad_key(created.id)));
    }

    #[tokio::test]
    async fn cache_outage_never_fails_requests() {
        let f = fixture();
        f.cache.set_failing(true);

        let created = seed(&f).await;
        assert_eq!(f.service.get_by_id(created.id).await.unwrap(), created);
        f.service
            .update(Some(&owner(1)), created.id, AdDraft::new("Phone", "", 700))
            .await
            .unwrap();
        assert_eq!(f.service.get_by_id(created.id).await.unwrap().price, 700);
        f.service.delete(Some(&owner(1)), created.id).await.unwrap();

        assert_eq!(f.service.cache_health().await, CacheHealth::Down);
    }

    #[tokio::test]
    async fn corrupt_entry_falls_back_to_store() {
        let f = fixture();
        let created = seed(&f).await;
        f.cache.insert_raw(&ad_key(created.id), b"\x00garbage");

        let read = f.service.get_by_id(created.id).await.unwrap();

        assert_eq!(read, created);
        assert_eq!(f.store.reads(), 1);
        // Repopulated from the store with a valid snapshot
        f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(f.store.reads(), 1);
    }

    #[tokio::test]
    async fn works_without_cache() {
        let store = Arc::new(MemoryAds::default());
        let service = AdService::new(store.clone(), AdRules::default());
        let created = service
            .create(Some(&owner(1)), AdDraft::new("Lamp", "", 15))
            .await
            .unwrap();

        service.get_by_id(created.id).await.unwrap();
        service.get_by_id(created.id).await.unwrap();

        assert_eq!(store.reads(), 2);
        assert_eq!(service.cache_health().await, CacheHealth::Disabled);
    }

    #[tokio::test]
    async fn lists_by_owner() {
        let f = fixture();
        seed(&f).await;
        f.service
            .create(Some(&owner(2)), AdDraft::new("Desk", "", 90))
            .await
            .unwrap();

        let mine = f.service.get_by_owner(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Phone");
        assert_eq!(f.service.get_all().await.unwrap().len(), 2);
        assert!(f.service.get_by_owner(0).await.is_err());
    }
}
