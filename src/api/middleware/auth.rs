//! Bearer token check applied to every route when a token is configured

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

pub async fn auth_middleware(
    State(expected): State<String>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            debug!("rejected request to {} with wrong token", request.uri());
            Err(ApiError::Unauthorized("invalid token".to_string()))
        }
        None => Err(ApiError::Unauthorized(
            "expected Authorization: Bearer <token>".to_string(),
        )),
    }
}
