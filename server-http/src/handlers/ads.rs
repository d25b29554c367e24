use super::{json_body, parse_id};
use crate::api::{api_error, AdRequest, AdResponse, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use board::Identity;
use tracing::info;

/// GET /ads - List every ad
pub async fn list_ads(State(state): State<AppState>) -> ApiResult<Json<Vec<AdResponse>>> {
    let ads = state.ads.get_all().await.map_err(api_error)?;
    Ok(Json(ads.into_iter().map(AdResponse::from).collect()))
}

/// GET /ads/{id} - Served from the ad cache when possible
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AdResponse>> {
    let id = parse_id(&id)?;
    info!("GET_AD: id={}", id);

    let ad = state.ads.get_by_id(id).await.map_err(api_error)?;
    Ok(Json(ad.into()))
}

/// POST /ads - The owner is always the caller
pub async fn create_ad(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    body: Result<Json<AdRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AdResponse>)> {
    let req = json_body(body)?;

    let ad = state
        .ads
        .create(Some(&caller), req.into())
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ad.into())))
}

/// PUT /ads/{id}
pub async fn update_ad(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
    body: Result<Json<AdRequest>, JsonRejection>,
) -> ApiResult<Json<AdResponse>> {
    let id = parse_id(&id)?;
    let req = json_body(body)?;

    let ad = state
        .ads
        .update(Some(&caller), id, req.into())
        .await
        .map_err(api_error)?;
    Ok(Json(ad.into()))
}

/// DELETE /ads/{id}
pub async fn delete_ad(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;

    state
        .ads
        .delete(Some(&caller), id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
