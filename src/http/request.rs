//! Request identification.
//!
//! # Design Decisions
//! - Request ID added by the outermost layer, before any stage runs
//! - An inbound `x-request-id` is kept, so a caller can correlate its own logs

use axum::http::HeaderMap;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID, if present and valid text.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}
