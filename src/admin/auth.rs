use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::security::token::BEARER_PREFIX;

/// Require `Authorization: Bearer <admin api key>`.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let inner = state.inner.load_full();

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX));

    let authorized = matches!(presented, Some(key) if key == inner.config.admin.api_key);
    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Admin request with bad API key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
