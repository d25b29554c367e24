use axum::{http::StatusCode, Json};
use serde::Serialize;
use shared::Error;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            error: error.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("invalid_argument", message)),
    )
}

/// Maps a domain error onto its HTTP status and body. Internal details are
/// logged, never returned.
pub fn api_error(err: Error) -> ApiError {
    let (status, code, message) = match err {
        Error::InvalidArgument(reason) => (StatusCode::BAD_REQUEST, "invalid_argument", reason),
        Error::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required".to_string(),
        ),
        Error::Forbidden => (
            StatusCode::FORBIDDEN,
            "forbidden",
            "not allowed to modify this resource".to_string(),
        ),
        Error::NotFound => (StatusCode::NOT_FOUND, "not_found", "not found".to_string()),
        Error::Conflict(reason) => (StatusCode::CONFLICT, "conflict", reason),
        Error::Internal(details) => {
            error!("Request failed: {}", details);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error".to_string(),
            )
        }
    };
    (status, Json(ErrorResponse::new(code, message)))
}
