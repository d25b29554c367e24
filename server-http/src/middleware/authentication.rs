use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let mut parts = auth_header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Some(token),
        _ => None,
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(ErrorResponse::new("unauthenticated", message)),
    )
        .into_response()
}

/// Bearer token middleware. On success the caller's `Identity` is attached
/// to the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Err(unauthorized("missing Authorization header")),
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| unauthorized("invalid token"))?;

    let identity = state
        .tokens
        .verify(token)
        .map_err(|_| unauthorized("invalid token"))?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
