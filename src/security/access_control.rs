//! Internal-only access control.
//! Admits callers whose derived client IP classifies as `Internal`.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;

use crate::security::headers::client_ip;
use crate::security::origin::{classify, NetworkClass};

/// Origin of a caller that passed the internal-only guard.
#[derive(Clone, Debug)]
pub struct CallerOrigin {
    pub ip: String,
    pub class: NetworkClass,
}

/// Middleware rejecting every caller that is not on the internal network.
///
/// Gateway addresses are rejected even though they sit in private ranges:
/// they are the hop external traffic arrives through.
pub async fn internal_only(mut req: Request<Body>, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer);
    let class = classify(&ip);

    if !class.is_internal() {
        tracing::warn!(client_ip = %ip, class = %class, path = %req.uri().path(), "Internal-only route denied");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "Access denied: this endpoint is only accessible from the internal network",
                "client_ip": ip,
                "network": class,
            })),
        )
            .into_response();
    }

    tracing::debug!(client_ip = %ip, "Internal-only route allowed");
    req.extensions_mut().insert(CallerOrigin { ip, class });
    next.run(req).await
}
