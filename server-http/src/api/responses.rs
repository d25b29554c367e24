use board::{Ad, User};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub cache: String,
}

#[derive(Debug, Serialize)]
pub struct AdResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub user_id: i64,
}

impl From<Ad> for AdResponse {
    fn from(ad: Ad) -> Self {
        Self {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            price: ad.price,
            user_id: ad.owner_id,
        }
    }
}

/// Public view of an account; the password hash never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub birthday: NaiveDate,
    pub contact: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            birthday: user.birthday,
            contact: user.contact,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}
