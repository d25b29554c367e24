use board::{AdDraft, NewUser, UserChanges};
use chrono::NaiveDate;
use serde::Deserialize;

/// Body of `POST /ads` and `PUT /ads/{id}`. A `user_id` field, if sent, is ignored.
#[derive(Debug, Deserialize)]
pub struct AdRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
}

impl From<AdRequest> for AdDraft {
    fn from(req: AdRequest) -> Self {
        AdDraft::new(req.title, req.description, req.price)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub contact: String,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            password: req.password,
            birthday: req.birthday,
            contact: req.contact,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub contact: String,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            name: req.name,
            email: req.email,
            birthday: req.birthday,
            contact: req.contact,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
