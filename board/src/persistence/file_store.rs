use crate::domain::{Ad, AdId, User, UserId};
use crate::persistence::json_file::{JsonFile, Keyed};
use crate::ports::{AdRepository, UserRepository};
use async_trait::async_trait;
use shared::{Error, Result};
use std::path::Path;

pub const ADS_FILE: &str = "ads.json";
pub const USERS_FILE: &str = "users.json";

impl Keyed for Ad {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for User {
    fn key(&self) -> i64 {
        self.id
    }
}

fn ensure_owner_exists(users: &[User], owner_id: UserId) -> Result<()> {
    if users.iter().any(|u| u.id == owner_id) {
        Ok(())
    } else {
        Err(Error::invalid("referenced user does not exist"))
    }
}

/// Ads file. Owner references are checked against the users file under both
/// locks, the same guarantee the Postgres foreign key gives.
#[derive(Clone)]
pub struct FileAdRepository {
    file: JsonFile<Ad>,
    users: JsonFile<User>,
}

impl FileAdRepository {
    /// Shares the lock of `users` so owner checks and user writes serialize.
    pub fn open(data_dir: &Path, users: &FileUserRepository) -> Result<Self> {
        Ok(Self {
            file: JsonFile::open(data_dir.join(ADS_FILE))?,
            users: users.file.clone(),
        })
    }
}

#[async_trait]
impl AdRepository for FileAdRepository {
    async fn get_all(&self) -> Result<Vec<Ad>> {
        self.file.read(Ok).await
    }

    async fn get_by_id(&self, id: AdId) -> Result<Ad> {
        self.file
            .read(move |ads| ads.into_iter().find(|ad| ad.id == id).ok_or(Error::NotFound))
            .await
    }

    async fn get_by_owner(&self, owner_id: UserId) -> Result<Vec<Ad>> {
        self.file
            .read(move |ads| Ok(ads.into_iter().filter(|ad| ad.owner_id == owner_id).collect()))
            .await
    }

    async fn create(&self, mut ad: Ad) -> Result<Ad> {
        self.file
            .modify_with(&self.users, move |ads, users| {
                ensure_owner_exists(users, ad.owner_id)?;
                ad.id = ads.allocate_id();
                ads.rows.push(ad.clone());
                Ok(ad)
            })
            .await
    }

    async fn update(&self, id: AdId, ad: Ad) -> Result<Ad> {
        self.file
            .modify_with(&self.users, move |ads, users| {
                let slot = ads
                    .rows
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or(Error::NotFound)?;
                ensure_owner_exists(users, ad.owner_id)?;
                slot.title = ad.title;
                slot.description = ad.description;
                slot.price = ad.price;
                slot.owner_id = ad.owner_id;
                Ok(slot.clone())
            })
            .await
    }

    async fn delete(&self, id: AdId) -> Result<()> {
        self.file
            .modify(move |ads| {
                let before = ads.rows.len();
                ads.rows.retain(|a| a.id != id);
                if ads.rows.len() == before {
                    return Err(Error::NotFound);
                }
                Ok(())
            })
            .await
    }
}

#[derive(Clone)]
pub struct FileUserRepository {
    file: JsonFile<User>,
}

impl FileUserRepository {
    pub fn open(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            file: JsonFile::open(data_dir.join(USERS_FILE))?,
        })
    }
}

fn email_taken(users: &[User], email: &str, except: UserId) -> Result<()> {
    if users.iter().any(|u| u.id != except && u.email == email) {
        return Err(Error::Conflict(format!("email {} is already registered", email)));
    }
    Ok(())
}

#[async_trait]
impl UserRepository for FileUserRepository {
    async fn get_all(&self) -> Result<Vec<User>> {
        self.file.read(Ok).await
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        self.file
            .read(move |users| users.into_iter().find(|u| u.id == id).ok_or(Error::NotFound))
            .await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.file
            .read(move |users| Ok(users.into_iter().find(|u| u.email == email)))
            .await
    }

    async fn create(&self, mut user: User) -> Result<User> {
        self.file
            .modify(move |users| {
                email_taken(&users.rows, &user.email, 0)?;
                user.id = users.allocate_id();
                users.rows.push(user.clone());
                Ok(user)
            })
            .await
    }

    async fn update(&self, id: UserId, mut user: User) -> Result<User> {
        self.file
            .modify(move |users| {
                email_taken(&users.rows, &user.email, id)?;
                let slot = users
                    .rows
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or(Error::NotFound)?;
                user.id = id;
                *slot = user.clone();
                Ok(user)
            })
            .await
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        self.file
            .modify(move |users| {
                let before = users.rows.len();
                users.rows.retain(|u| u.id != id);
                if users.rows.len() == before {
                    return Err(Error::NotFound);
                }
                Ok(())
            })
            .await
    }
}
