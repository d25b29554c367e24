use board::ads::AdCache;
use board::auth::TokenIssuer;
use board::persistence::{
    pg_store, FileAdRepository, FileUserRepository, PgAdRepository, PgUserRepository,
};
use board::validation::AdRules;
use board::{AdRepository, AdService, UserRepository, UserService};
use shared::config::{Config, StoreBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const CACHE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ads: AdService,
    pub users: UserService,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Wires services over already-open stores. An absent cache runs the board uncached.
    pub fn new(
        ad_repo: Arc<dyn AdRepository>,
        user_repo: Arc<dyn UserRepository>,
        cache: Option<AdCache>,
        rules: AdRules,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        let ads = match cache {
            Some(cache) => AdService::with_cache(ad_repo, cache, rules),
            None => AdService::new(ad_repo, rules),
        };
        let users = UserService::new(user_repo, ads.clone(), tokens.clone());

        Self { ads, users, tokens }
    }

    /// Opens the configured primary store and cache.
    pub async fn from_config(config: &Config) -> shared::Result<Self> {
        let (ad_repo, user_repo): (Arc<dyn AdRepository>, Arc<dyn UserRepository>) =
            match &config.store {
                StoreBackend::Postgres(url) => {
                    info!("Connecting to postgres primary store...");
                    let pool = pg_store::connect(url, &config.pool).await?;
                    (
                        Arc::new(PgAdRepository::new(pool.clone())),
                        Arc::new(PgUserRepository::new(pool)),
                    )
                }
                StoreBackend::File(dir) => {
                    info!("Using file primary store at {}", dir);
                    let dir = Path::new(dir);
                    let users = FileUserRepository::open(dir)?;
                    let ads = FileAdRepository::open(dir, &users)?;
                    (Arc::new(ads), Arc::new(users))
                }
            };

        let cache = storage_engine::build_cache(&config.cache, CACHE_CONNECT_TIMEOUT)
            .await?
            .map(|store| AdCache::new(store, config.cache_ttl, config.cache_timeout));

        let tokens = Arc::new(TokenIssuer::new(&config.signing_key, config.token_ttl));
        let rules = AdRules::with_min_price(config.min_price);

        Ok(Self::new(ad_repo, user_repo, cache, rules, tokens))
    }
}
