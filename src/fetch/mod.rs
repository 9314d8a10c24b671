//! Outbound fetch validator.
//!
//! # Data Flow
//! ```text
//! caller (tasks.rs, gatewayctl)
//!     → OutboundFetcher::fetch(profile, url, mode)
//!     → parse URL (http/https only)
//!     → send with the profile's client (user agent, connect/read timeouts)
//!     → capture.rs (line cap + byte cap, success and error bodies alike)
//!     → result.rs (FetchResult: success or error tag, never an Err)
//! ```
//!
//! # Design Decisions
//! - No allow-list or deny-list here; restricting targets is the caller's job
//! - One client per profile, built once, so timeouts cannot drift per call
//! - Every failure becomes a `FetchResult` error value with the underlying message

pub mod capture;
pub mod result;
pub mod tasks;

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use url::Url;

use crate::config::{FetchConfig, FetchProfileConfig};
use crate::observability::metrics;

pub use capture::LineCapture;
pub use result::{FetchErrorKind, FetchOutcome, FetchResult};

/// The call sites that fetch caller-supplied URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    AvatarValidation,
    AvatarImport,
    EmailDomain,
    MxCheck,
    Webhook,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 5] = [
        ProfileKind::AvatarValidation,
        ProfileKind::AvatarImport,
        ProfileKind::EmailDomain,
        ProfileKind::MxCheck,
        ProfileKind::Webhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::AvatarValidation => "avatar_validation",
            ProfileKind::AvatarImport => "avatar_import",
            ProfileKind::EmailDomain => "email_domain",
            ProfileKind::MxCheck => "mx_check",
            ProfileKind::Webhook => "webhook",
        }
    }

    fn config<'a>(&self, fetch: &'a FetchConfig) -> &'a FetchProfileConfig {
        match self {
            ProfileKind::AvatarValidation => &fetch.avatar_validation,
            ProfileKind::AvatarImport => &fetch.avatar_import,
            ProfileKind::EmailDomain => &fetch.email_domain,
            ProfileKind::MxCheck => &fetch.mx_check,
            ProfileKind::Webhook => &fetch.webhook,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown fetch profile '{}'", s))
    }
}

/// Request method and payload.
#[derive(Debug, Clone)]
pub enum FetchMode {
    Get,
    Post(serde_json::Value),
}

/// Bounds and identity for one call site.
#[derive(Debug, Clone)]
pub struct FetchProfile {
    pub kind: ProfileKind,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_lines: usize,
    client: reqwest::Client,
}

impl FetchProfile {
    fn build(kind: ProfileKind, product: &str, config: &FetchProfileConfig) -> Result<Self, reqwest::Error> {
        let user_agent = format!("{} {}", product, config.agent);
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        let read_timeout = Duration::from_millis(config.read_timeout_ms);

        let client = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            // Upper bound for the whole exchange
            .timeout(connect_timeout + read_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            kind,
            user_agent,
            connect_timeout,
            read_timeout,
            max_lines: config.max_lines,
            client,
        })
    }

    /// Worst-case wall time of one fetch with this profile.
    pub fn deadline(&self) -> Duration {
        self.connect_timeout + self.read_timeout
    }
}

/// Bounded HTTP client for caller-supplied URLs.
#[derive(Debug, Clone)]
pub struct OutboundFetcher {
    profiles: BTreeMap<&'static str, FetchProfile>,
    max_body_bytes: usize,
}

impl OutboundFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut profiles = BTreeMap::new();
        for kind in ProfileKind::ALL {
            let profile = FetchProfile::build(kind, &config.user_agent, kind.config(config))?;
            profiles.insert(kind.as_str(), profile);
        }
        Ok(Self {
            profiles,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn profile(&self, kind: ProfileKind) -> Option<&FetchProfile> {
        self.profiles.get(kind.as_str())
    }

    /// Fetch `url` under the given profile. Never fails: every problem is
    /// reported inside the returned `FetchResult`.
    pub async fn fetch(&self, kind: ProfileKind, url: &str, mode: FetchMode) -> FetchResult {
        let result = match self.profile(kind) {
            Some(profile) => self.fetch_with(profile, url, mode).await,
            None => FetchResult::error(url, FetchErrorKind::Request, format!("no client for profile {}", kind)),
        };

        match &result.outcome {
            FetchOutcome::Success { http_code, truncated, .. } => tracing::info!(
                profile = %kind,
                url = %url,
                http_code = *http_code,
                truncated = *truncated,
                "Outbound fetch completed"
            ),
            FetchOutcome::Error { error, message, .. } => tracing::warn!(
                profile = %kind,
                url = %url,
                error = %error,
                message = %message,
                "Outbound fetch failed"
            ),
        }
        metrics::record_outbound_fetch(kind.as_str(), &result.status_label());
        result
    }

    async fn fetch_with(&self, profile: &FetchProfile, url: &str, mode: FetchMode) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return FetchResult::error(url, FetchErrorKind::InvalidUrl, e.to_string()),
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return FetchResult::error(
                url,
                FetchErrorKind::UnsupportedScheme,
                format!("unsupported scheme '{}'", parsed.scheme()),
            );
        }

        let request = match mode {
            FetchMode::Get => profile.client.get(parsed),
            FetchMode::Post(payload) => profile.client.post(parsed).json(&payload),
        };

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::error(url, FetchErrorKind::from_reqwest(&e), error_chain(&e)),
        };

        let http_code = response.status().as_u16();
        let content_type = header_text(response.headers(), CONTENT_TYPE);
        let content_length = header_text(response.headers(), CONTENT_LENGTH)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(-1);
        let headers = first_values(response.headers());
        let expected_len = response.content_length();

        // Body is read whatever the status: error pages are captured too
        let mut capture = LineCapture::new(profile.max_lines, self.max_body_bytes);
        let mut stopped_early = false;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if !capture.push(&chunk) {
                        stopped_early = true;
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => return FetchResult::error(url, FetchErrorKind::from_reqwest(&e), error_chain(&e)),
            }
        }
        let unseen_tail =
            stopped_early && expected_len.map_or(true, |len| (capture.bytes_seen() as u64) < len);
        let (response_body, truncated) = capture.finish(unseen_tail);

        let is_valid_image = result::looks_like_image(content_type.as_deref());
        let recommendation = if is_valid_image {
            result::RECOMMEND_VALID
        } else {
            result::RECOMMEND_DOUBTFUL
        };

        FetchResult {
            url: url.to_string(),
            timestamp: chrono::Utc::now(),
            outcome: FetchOutcome::Success {
                http_code,
                content_type,
                content_length,
                response_body,
                headers,
                is_valid_image,
                recommendation: recommendation.to_string(),
                truncated,
            },
        }
    }
}

fn header_text(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn first_values(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            headers
                .get(name)
                .map(|v| (name.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        })
        .collect()
}

/// Error message with its source chain, outermost first.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
