//! Response construction for requests the gateway answers itself.
//!
//! # Responsibilities
//! - Render pipeline terminations with their status, body and headers
//! - Map forwarding failures to gateway status codes
//!
//! # Design Decisions
//! - Every gateway-generated body is JSON `{"error": .., "status": ..}`
//! - Backend timeouts result in 504 Gateway Timeout, connection failures in 502

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::pipeline::Termination;

impl IntoResponse for Termination {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        for (name, value) in self.headers.iter() {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

/// JSON error response produced by the gateway itself.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": message,
            "status": status.as_u16(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::headers::{SSRF_BLOCKED, X_SSRF_PROTECTION};
    use axum::http::header;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_termination_response_keeps_headers() {
        let termination = Termination::new(
            "ssrf_detection",
            StatusCode::FORBIDDEN,
            "SSRF attempt detected",
            Some("suspicious_url_pattern"),
        )
        .with_header(X_SSRF_PROTECTION, SSRF_BLOCKED);

        let response = termination.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[&X_SSRF_PROTECTION], "blocked");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 403);
        assert_eq!(body["reason"], "suspicious_url_pattern");
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = error_response(StatusCode::GATEWAY_TIMEOUT, "Upstream timed out");
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Upstream timed out");
        assert_eq!(body["status"], 504);
    }
}
