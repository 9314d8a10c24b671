//! Structured outcome of an outbound fetch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Failure tag carried by an error result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    Timeout,
    Connect,
    Redirect,
    Body,
    Request,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::InvalidUrl => "invalid_url",
            FetchErrorKind::UnsupportedScheme => "unsupported_scheme",
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::Connect => "connect",
            FetchErrorKind::Redirect => "redirect",
            FetchErrorKind::Body => "body",
            FetchErrorKind::Request => "request",
        }
    }

    /// Classify a client error. Timeouts win over connect failures.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchErrorKind::Timeout
        } else if error.is_connect() {
            FetchErrorKind::Connect
        } else if error.is_redirect() {
            FetchErrorKind::Redirect
        } else if error.is_body() || error.is_decode() {
            FetchErrorKind::Body
        } else {
            FetchErrorKind::Request
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const RECOMMEND_VALID: &str = "URL appears to be valid for avatar";
pub const RECOMMEND_DOUBTFUL: &str = "URL may not be a valid image, but validation completed";
pub const ERROR_HINT: &str = "Network error or invalid URL";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        http_code: u16,
        content_type: Option<String>,
        /// `-1` when the response did not declare a length.
        content_length: i64,
        response_body: String,
        /// First value of each response header.
        headers: BTreeMap<String, String>,
        is_valid_image: bool,
        recommendation: String,
        truncated: bool,
    },
    Error {
        error: FetchErrorKind,
        message: String,
        hint: String,
    },
}

/// Result of one outbound fetch. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn error(url: &str, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            timestamp: Utc::now(),
            outcome: FetchOutcome::Error {
                error: kind,
                message: message.into(),
                hint: ERROR_HINT.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }

    pub fn http_code(&self) -> Option<u16> {
        match &self.outcome {
            FetchOutcome::Success { http_code, .. } => Some(*http_code),
            FetchOutcome::Error { .. } => None,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Success { content_type, .. } => content_type.as_deref(),
            FetchOutcome::Error { .. } => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Success { response_body, .. } => Some(response_body),
            FetchOutcome::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<FetchErrorKind> {
        match &self.outcome {
            FetchOutcome::Error { error, .. } => Some(*error),
            FetchOutcome::Success { .. } => None,
        }
    }

    /// Error message, if the fetch failed.
    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Error { message, .. } => Some(message),
            FetchOutcome::Success { .. } => None,
        }
    }

    /// Short label for logs and metrics: the status code or the error kind.
    pub fn status_label(&self) -> String {
        match &self.outcome {
            FetchOutcome::Success { http_code, .. } => http_code.to_string(),
            FetchOutcome::Error { error, .. } => error.to_string(),
        }
    }
}

/// Advisory content-type check. Does not gate the fetch.
pub fn looks_like_image(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => {
            ct.starts_with("image/") || ct.contains("json") || ct.contains("html") || ct.contains("text")
        }
        None => false,
    }
}
