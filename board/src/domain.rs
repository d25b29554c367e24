use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type AdId = i64;
pub type UserId = i64;

/// A classified ad as stored in the primary store.
///
/// The same shape is serialized into the cache, so a cached snapshot
/// deserializes straight back into an `Ad`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: AdId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
}

/// Caller-supplied ad fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdDraft {
    pub title: String,
    pub description: String,
    pub price: i64,
}

impl AdDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>, price: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            price,
        }
    }

    /// Id 0 means "not yet assigned"; the store picks the real one.
    pub fn into_ad(self, owner_id: UserId) -> Ad {
        Ad {
            id: 0,
            title: self.title,
            description: self.description,
            price: self.price,
            owner_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub birthday: NaiveDate,
    pub contact: String,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub birthday: NaiveDate,
    pub contact: String,
}

/// The authenticated caller of a request, produced by token verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
}

impl Identity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
