use super::{json_body, parse_id};
use crate::api::{
    api_error, AdResponse, ApiResult, CreateUserRequest, UpdateUserRequest, UserResponse,
};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use board::Identity;

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.users.get_all().await.map_err(api_error)?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let user = state.users.get_by_id(id).await.map_err(api_error)?;
    Ok(Json(user.into()))
}

/// GET /users/{id}/ads
pub async fn get_user_ads(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AdResponse>>> {
    let id = parse_id(&id)?;
    let ads = state.users.get_users_ads(id).await.map_err(api_error)?;
    Ok(Json(ads.into_iter().map(AdResponse::from).collect()))
}

/// POST /users - Open registration
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let req = json_body(body)?;
    let user = state.users.create(req.into()).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /users/{id} - Only the account itself
pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let req = json_body(body)?;

    let user = state
        .users
        .update(Some(&caller), id, req.into())
        .await
        .map_err(api_error)?;
    Ok(Json(user.into()))
}

/// DELETE /users/{id} - Also removes the user's ads
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .users
        .delete(Some(&caller), id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
