//! Header handling at the trust boundary.
//!
//! # Responsibilities
//! - Name the identity propagation and protection-marker headers
//! - Derive the client IP (X-Forwarded-For first entry, X-Real-IP, peer)
//! - Strip caller-supplied identity headers and inject verified ones
//!
//! # Design Decisions
//! - Backends trust `X-User-*` only because the gateway rewrites them on every request
//! - Header values that are not valid header text are dropped rather than forwarded

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::net::SocketAddr;

use crate::security::token::IdentityClaims;

pub const X_USER_USERNAME: HeaderName = HeaderName::from_static("x-user-username");
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");
pub const X_SSRF_PROTECTION: HeaderName = HeaderName::from_static("x-ssrf-protection");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Value of `X-SSRF-Protection` on blocked requests.
pub const SSRF_BLOCKED: &str = "blocked";

/// Client address as reported by proxy headers, falling back to the peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(&X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get(&X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Remove any identity headers the caller sent.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(&X_USER_USERNAME);
    headers.remove(&X_USER_ROLE);
}

/// Set identity headers from verified claims.
pub fn inject_identity_headers(headers: &mut HeaderMap, claims: &IdentityClaims) {
    match HeaderValue::from_str(&claims.subject) {
        Ok(value) => {
            headers.insert(X_USER_USERNAME, value);
        }
        Err(_) => tracing::warn!(subject = %claims.subject, "Subject is not a valid header value"),
    }
    match HeaderValue::from_str(claims.role.as_str()) {
        Ok(value) => {
            headers.insert(X_USER_ROLE, value);
        }
        Err(_) => tracing::warn!(role = %claims.role, "Role is not a valid header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::token::Role;
    use chrono::Utc;

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "172.18.0.1:51000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "172.18.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert(X_REAL_IP, HeaderValue::from_static("10.0.0.7"));
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.7");

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" 203.0.113.9 , 10.0.0.2"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(""));
        headers.insert(X_REAL_IP, HeaderValue::from_static("10.0.0.7"));
        assert_eq!(client_ip(&headers, None), "10.0.0.7");
    }

    #[test]
    fn test_strip_then_inject() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_USERNAME, HeaderValue::from_static("spoofed"));
        headers.insert(X_USER_ROLE, HeaderValue::from_static("ADMIN"));

        strip_identity_headers(&mut headers);
        assert!(headers.get(&X_USER_USERNAME).is_none());
        assert!(headers.get(&X_USER_ROLE).is_none());

        let claims = IdentityClaims {
            subject: "alice".into(),
            role: Role::User,
            expires_at: Utc::now(),
        };
        inject_identity_headers(&mut headers, &claims);
        assert_eq!(headers[&X_USER_USERNAME], "alice");
        assert_eq!(headers[&X_USER_ROLE], "USER");
    }
}
