use super::json_body;
use crate::api::{api_error, ApiResult, LoginRequest, LoginResponse};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

/// POST /auth/login
///
/// Exchanges `{"email", "password"}` for a signed bearer token. Unknown email
/// and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let req = json_body(body)?;

    let issued = state
        .users
        .login(&req.email, &req.password)
        .await
        .map_err(api_error)?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in.as_secs(),
    }))
}
