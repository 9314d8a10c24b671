//! Per-request context carried through the filter pipeline.

use axum::http::{header, request::Parts, HeaderMap, Method, Uri};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;

use crate::http::request::request_id;
use crate::security::headers::{client_ip, inject_identity_headers, strip_identity_headers};
use crate::security::token::IdentityClaims;

/// Advisory flags raised by stages that let a request through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Path matched a sensitive fragment in the request log table.
    SensitiveEndpoint(String),
    /// Path matched a known SSRF-prone route.
    HighRiskEndpoint(String),
}

/// Everything the stages need to know about one inbound request.
///
/// Caller-supplied identity headers are removed on construction; the only
/// way identity reaches the backend is through verified claims.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    client_ip: String,
    received_at: DateTime<Utc>,
    identity: Option<IdentityClaims>,
    advisories: Vec<Advisory>,
}

impl RequestContext {
    pub fn new(method: Method, uri: &Uri, mut headers: HeaderMap, peer: Option<SocketAddr>) -> Self {
        strip_identity_headers(&mut headers);
        let request_id = request_id(&headers).unwrap_or("unknown").to_string();
        let client_ip = client_ip(&headers, peer);

        Self {
            request_id,
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            client_ip,
            received_at: Utc::now(),
            identity: None,
            advisories: Vec::new(),
        }
    }

    pub fn from_parts(parts: &Parts, peer: Option<SocketAddr>) -> Self {
        Self::new(parts.method.clone(), &parts.uri, parts.headers.clone(), peer)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Path plus query, as sent to the backend.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Raw Authorization value. A present but non-text value reads as empty.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap_or(""))
    }

    pub fn identity(&self) -> Option<&IdentityClaims> {
        self.identity.as_ref()
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub(crate) fn with_identity(mut self, claims: IdentityClaims) -> Self {
        self.identity = Some(claims);
        self
    }

    pub(crate) fn with_advisory(mut self, advisory: Advisory) -> Self {
        self.advisories.push(advisory);
        self
    }

    /// Headers for the forwarded request: the inbound set plus identity
    /// headers when, and only when, authentication attached claims.
    pub fn forward_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        strip_identity_headers(&mut headers);
        if let Some(claims) = &self.identity {
            inject_identity_headers(&mut headers, claims);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::headers::{X_USER_ROLE, X_USER_USERNAME};
    use crate::security::token::Role;
    use axum::http::HeaderValue;

    fn context(headers: HeaderMap) -> RequestContext {
        let uri: Uri = "/api/users/me?page=2".parse().unwrap();
        RequestContext::new(Method::GET, &uri, headers, Some("10.0.0.9:4000".parse().unwrap()))
    }

    #[test]
    fn test_spoofed_identity_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_USERNAME, HeaderValue::from_static("admin"));
        headers.insert(X_USER_ROLE, HeaderValue::from_static("ADMIN"));

        let ctx = context(headers);
        assert!(ctx.headers().get(&X_USER_USERNAME).is_none());
        assert!(ctx.forward_headers().get(&X_USER_ROLE).is_none());
    }

    #[test]
    fn test_identity_is_forwarded() {
        let ctx = context(HeaderMap::new()).with_identity(IdentityClaims {
            subject: "alice".into(),
            role: Role::Admin,
            expires_at: Utc::now(),
        });
        let headers = ctx.forward_headers();
        assert_eq!(headers[&X_USER_USERNAME], "alice");
        assert_eq!(headers[&X_USER_ROLE], "ADMIN");
    }

    #[test]
    fn test_request_fields() {
        let ctx = context(HeaderMap::new());
        assert_eq!(ctx.path(), "/api/users/me");
        assert_eq!(ctx.query(), Some("page=2"));
        assert_eq!(ctx.path_and_query(), "/api/users/me?page=2");
        assert_eq!(ctx.client_ip(), "10.0.0.9");
        assert_eq!(ctx.request_id(), "unknown");
        assert_eq!(ctx.authorization(), None);
    }
}
