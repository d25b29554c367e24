use crate::api::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};

/// GET /health - A down cache is reported, never fatal
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.ads.cache_health().await;
    Json(HealthResponse {
        message: "OK".into(),
        cache: cache.as_str().into(),
    })
}
