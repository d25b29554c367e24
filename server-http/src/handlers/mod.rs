pub mod ads;
pub mod auth;
pub mod health;
pub mod users;

pub use ads::{create_ad, delete_ad, get_ad, list_ads, update_ad};
pub use auth::login;
pub use health::health_check;
pub use users::{create_user, delete_user, get_user, get_user_ads, list_users, update_user};

use crate::api::{bad_request, ApiResult};
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Path ids arrive as text so a non-integer can be reported as a 400 in our error shape.
pub(crate) fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| bad_request(format!("id must be an integer, got '{}'", raw)))
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(inner)| inner)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_only_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("-3").unwrap(), -3);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("4.5").is_err());
        assert!(parse_id("").is_err());
    }
}
