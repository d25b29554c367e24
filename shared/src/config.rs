use std::time::Duration;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(String), // database url
    File(String),     // data directory
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    Redis(String), // redis url
    Memory(u64),   // max entries
    Disabled,
}

#[derive(Debug, Clone)]
pub struct PostgresPool {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub store: StoreBackend,
    pub pool: PostgresPool,
    pub cache: CacheBackend,
    pub cache_ttl: Duration,
    pub cache_timeout: Duration,
    pub signing_key: String,
    pub token_ttl: Duration,
    pub min_price: i64,
    pub request_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "127.0.0.1";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
    const DEFAULT_CACHE_TTL_SECS: u64 = 600;
    const DEFAULT_CACHE_TIMEOUT_MS: u64 = 250;
    const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
    const DEFAULT_TOKEN_TTL_SECS: u64 = 12 * 60 * 60;
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let signing_key = get("BOARD_SIGNING_KEY").ok_or(ConfigError::Missing("BOARD_SIGNING_KEY"))?;
        if signing_key.len() < 16 {
            return Err(ConfigError::Invalid {
                key: "BOARD_SIGNING_KEY",
                value: "<redacted>".to_string(),
                reason: "must be at least 16 characters",
            });
        }

        let store = match get("BOARD_STORE").as_deref().unwrap_or("postgres") {
            "postgres" | "pg" => StoreBackend::Postgres(Self::database_url(&get)?),
            "file" => StoreBackend::File(
                get("BOARD_DATA_DIR").unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
            ),
            other => {
                return Err(ConfigError::Invalid {
                    key: "BOARD_STORE",
                    value: other.to_string(),
                    reason: "must be 'postgres' or 'file'",
                })
            }
        };

        let cache = match get("BOARD_CACHE").as_deref().unwrap_or("redis") {
            "redis" => CacheBackend::Redis(
                get("BOARD_REDIS_URL").unwrap_or_else(|| Self::DEFAULT_REDIS_URL.to_string()),
            ),
            "memory" => CacheBackend::Memory(parse_or(
                &get,
                "BOARD_CACHE_CAPACITY",
                Self::DEFAULT_CACHE_CAPACITY,
            )?),
            "none" | "off" => CacheBackend::Disabled,
            other => {
                return Err(ConfigError::Invalid {
                    key: "BOARD_CACHE",
                    value: other.to_string(),
                    reason: "must be 'redis', 'memory' or 'none'",
                })
            }
        };

        let min_price: i64 = parse_or(&get, "BOARD_MIN_PRICE", 0)?;
        if min_price < 0 {
            return Err(ConfigError::Invalid {
                key: "BOARD_MIN_PRICE",
                value: min_price.to_string(),
                reason: "must not be negative",
            });
        }

        Ok(Self {
            host: get("BOARD_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port: parse_or(&get, "BOARD_HTTP_PORT", Self::DEFAULT_HTTP_PORT)?,
            store,
            pool: PostgresPool {
                max_connections: parse_or(
                    &get,
                    "BOARD_DB_MAX_CONNECTIONS",
                    Self::DEFAULT_MAX_CONNECTIONS,
                )?,
                acquire_timeout: Duration::from_millis(parse_or(
                    &get,
                    "BOARD_DB_ACQUIRE_TIMEOUT_MS",
                    Self::DEFAULT_ACQUIRE_TIMEOUT_MS,
                )?),
            },
            cache,
            cache_ttl: Duration::from_secs(parse_or(
                &get,
                "BOARD_CACHE_TTL_SECS",
                Self::DEFAULT_CACHE_TTL_SECS,
            )?),
            cache_timeout: Duration::from_millis(parse_or(
                &get,
                "BOARD_CACHE_TIMEOUT_MS",
                Self::DEFAULT_CACHE_TIMEOUT_MS,
            )?),
            signing_key,
            token_ttl: Duration::from_secs(parse_or(
                &get,
                "BOARD_TOKEN_TTL_SECS",
                Self::DEFAULT_TOKEN_TTL_SECS,
            )?),
            min_price,
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "BOARD_REQUEST_TIMEOUT_SECS",
                Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            allowed_origins: get("BOARD_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    // DATABASE_URL wins; otherwise the URL is assembled from the DB_* parts.
    fn database_url<G>(get: &G) -> Result<String, ConfigError>
    where
        G: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get("DATABASE_URL") {
            return Ok(url);
        }

        let user = get("DB_USER").ok_or(ConfigError::Missing("DATABASE_URL or DB_USER"))?;
        let password = get("DB_PASSWORD").unwrap_or_default();
        let host = get("DB_HOST").unwrap_or_else(|| "localhost".to_string());
        let port = get("DB_PORT").unwrap_or_else(|| "5432".to_string());
        let database = get("DB_DATABASE").ok_or(ConfigError::Missing("DB_DATABASE"))?;

        if password.is_empty() {
            warn!("DB_PASSWORD not set, connecting to Postgres without a password");
        }

        Ok(format!(
            "postgresql://{}:{}@{}:{}/{}",
            user, password, host, port, database
        ))
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
            reason: "not a valid number",
        }),
        None => Ok(default),
    }
}
