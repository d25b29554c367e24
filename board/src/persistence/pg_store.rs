use crate::domain::{Ad, AdId, User, UserId};
use crate::ports::{AdRepository, UserRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::config::PostgresPool;
use shared::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Opens the pool and applies migrations before any request is served.
///
/// The database URL may carry credentials and is never logged.
pub async fn connect(url: &str, pool: &PostgresPool) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(url)
        .map_err(|e| Error::internal("invalid database url", e))?;

    let mut attempt = 1;
    let pg = loop {
        let result = PgPoolOptions::new()
            .max_connections(pool.max_connections)
            .acquire_timeout(pool.acquire_timeout)
            .connect_with(options.clone())
            .await;

        match result {
            Ok(pg) => break pg,
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(
                    attempt,
                    error = %e,
                    "postgres connection failed, retrying in {:?}", CONNECT_BACKOFF
                );
                attempt += 1;
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => return Err(Error::internal("failed to connect to postgres", e)),
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pg)
        .await
        .map_err(|e| Error::internal("failed to run migrations", e))?;

    info!("Connected to postgres after {} attempt(s)", attempt);
    Ok(pg)
}

fn store_error(context: &str, err: sqlx::Error) -> Error {
    if let sqlx::Error::RowNotFound = err {
        return Error::NotFound;
    }
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return Error::Conflict(db_err.message().to_string()),
            Some("23503") => return Error::invalid("referenced user does not exist"),
            Some("23514") => return Error::invalid(db_err.message().to_string()),
            _ => {}
        }
    }
    Error::internal(context, err)
}

#[derive(Debug, FromRow)]
struct DbAd {
    id: i64,
    title: String,
    description: String,
    price: i64,
    user_id: i64,
}

impl From<DbAd> for Ad {
    fn from(row: DbAd) -> Self {
        Ad {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            owner_id: row.user_id,
        }
    }
}

#[derive(Clone)]
pub struct PgAdRepository {
    pool: PgPool,
}

impl PgAdRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdRepository for PgAdRepository {
    async fn get_all(&self) -> Result<Vec<Ad>> {
        let rows = sqlx::query_as::<_, DbAd>(
            r#"SELECT id, title, description, price, user_id FROM ads ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("failed to list ads", e))?;
        Ok(rows.into_iter().map(Ad::from).collect())
    }

    async fn get_by_id(&self, id: AdId) -> Result<Ad> {
        let row = sqlx::query_as::<_, DbAd>(
            r#"SELECT id, title, description, price, user_id FROM ads WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("failed to read ad", e))?;
        row.map(Ad::from).ok_or(Error::NotFound)
    }

    async fn get_by_owner(&self, owner_id: UserId) -> Result<Vec<Ad>> {
        let rows = sqlx::query_as::<_, DbAd>(
            r#"SELECT id, title, description, price, user_id FROM ads WHERE user_id = $1 ORDER BY id"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("failed to list ads of user", e))?;
        Ok(rows.into_iter().map(Ad::from).collect())
    }

    async fn create(&self, ad: Ad) -> Result<Ad> {
        let row = sqlx::query_as::<_, DbAd>(
            r#"INSERT INTO ads (title, description, price, user_id) VALUES ($1, $2, $3, $4)
               RETURNING id, title, description, price, user_id"#,
        )
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(ad.price)
        .bind(ad.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("failed to create ad", e))?;
        Ok(row.into())
    }

    async fn update(&self, id: AdId, ad: Ad) -> Result<Ad> {
        let row = sqlx::query_as::<_, DbAd>(
            r#"UPDATE ads SET title = $1, description = $2, price = $3, user_id = $4 WHERE id = $5
               RETURNING id, title, description, price, user_id"#,
        )
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(ad.price)
        .bind(ad.owner_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("failed to update ad", e))?;
        row.map(Ad::from).ok_or(Error::NotFound)
    }

    async fn delete(&self, id: AdId) -> Result<()> {
        let removed = sqlx::query(r#"DELETE FROM ads WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("failed to delete ad", e))?;
        if removed.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct DbUser {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    birthday: NaiveDate,
    contact: String,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            birthday: row.birthday,
            contact: row.contact,
        }
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, DbUser>(
            r#"SELECT id, name, email, password_hash, birthday, contact FROM users ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("failed to list users", e))?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"SELECT id, name, email, password_hash, birthday, contact FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("failed to read user", e))?;
        row.map(User::from).ok_or(Error::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"SELECT id, name, email, password_hash, birthday, contact FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("failed to read user by email", e))?;
        Ok(row.map(User::from))
    }

    async fn create(&self, user: User) -> Result<User> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"INSERT INTO users (name, email, password_hash, birthday, contact) VALUES ($1, $2, $3, $4, $5)
               RETURNING id, name, email, password_hash, birthday, contact"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.birthday)
        .bind(&user.contact)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("failed to create user", e))?;
        Ok(row.into())
    }

    async fn update(&self, id: UserId, user: User) -> Result<User> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"UPDATE users SET name = $1, email = $2, password_hash = $3, birthday = $4, contact = $5
               WHERE id = $6
               RETURNING id, name, email, password_hash, birthday, contact"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.birthday)
        .bind(&user.contact)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("failed to update user", e))?;
        row.map(User::from).ok_or(Error::NotFound)
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let removed = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("failed to delete user", e))?;
        if removed.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
