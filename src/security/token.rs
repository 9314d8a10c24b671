//! Bearer token verification and issuance.
//!
//! # Responsibilities
//! - Split the `Authorization` value into scheme and token
//! - Verify HS256 signature, expiry and (optionally) issuer
//! - Produce typed `IdentityClaims` or an `AuthFailure`
//! - Mint tokens for operators and tests
//!
//! # Design Decisions
//! - Claims that fail any check never become `IdentityClaims`
//! - Zero leeway by default: a token is dead the second `exp` passes
//! - Keys are built once per runtime and shared read-only

use axum::http::HeaderValue;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::AuthConfig;

/// Literal prefix required on the Authorization value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Upper bound on issued token lifetime (ten years).
const MAX_TTL_SECS: u64 = 10 * 365 * 86_400;

/// Role carried in the `role` claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ADMIN" => Role::Admin,
            "USER" => Role::User,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::from(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Why a request could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization header format")]
    MalformedScheme,

    #[error("Invalid or expired token: {0}")]
    InvalidOrExpiredToken(String),
}

impl AuthFailure {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "missing_header",
            AuthFailure::MalformedScheme => "malformed_scheme",
            AuthFailure::InvalidOrExpiredToken(_) => "invalid_token",
        }
    }
}

/// Wire format of the token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
}

/// Validates bearer credentials.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Verify an optional Authorization header value.
    pub fn verify(&self, authorization: Option<&str>) -> Result<IdentityClaims, AuthFailure> {
        let value = authorization.ok_or(AuthFailure::MissingHeader)?;
        let token = value
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthFailure::MalformedScheme)?;
        self.verify_token(token)
    }

    /// Verify a bare token (no scheme prefix).
    pub fn verify_token(&self, token: &str) -> Result<IdentityClaims, AuthFailure> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthFailure::InvalidOrExpiredToken(e.to_string()))?;
        let claims = data.claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| {
            AuthFailure::InvalidOrExpiredToken("exp out of range".to_string())
        })?;

        if claims.sub.is_empty() {
            return Err(AuthFailure::InvalidOrExpiredToken("empty subject".to_string()));
        }
        // Claims are forwarded as X-User-* headers; both must be representable
        if HeaderValue::from_str(&claims.sub).is_err() {
            return Err(AuthFailure::InvalidOrExpiredToken("subject is not valid header text".to_string()));
        }
        if HeaderValue::from_str(claims.role.as_str()).is_err() {
            return Err(AuthFailure::InvalidOrExpiredToken("role is not valid header text".to_string()));
        }

        Ok(IdentityClaims {
            subject: claims.sub,
            role: claims.role,
            expires_at,
        })
    }
}

/// Mints HS256 tokens with the gateway secret.
#[derive(Clone)]
pub struct JwtIssuer {
    key: EncodingKey,
    issuer: Option<String>,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl: Duration::seconds(config.token_ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    /// Issue a token valid for the configured TTL.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_until(subject, role, Utc::now() + self.ttl)
    }

    /// Issue a token with an explicit expiry instant.
    pub fn issue_until(
        &self,
        subject: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            role,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}
