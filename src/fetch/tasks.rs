//! Call sites that fetch caller-supplied URLs.
//!
//! None of these consult the SSRF detector; the gateway screens inbound
//! query strings only.

use serde::Serialize;
use serde_json::json;

use crate::fetch::{FetchMode, FetchOutcome, FetchResult, OutboundFetcher, ProfileKind};

/// Interactive avatar URL check: the full fetch result goes back to the caller.
pub async fn validate_avatar_url(fetcher: &OutboundFetcher, url: &str) -> FetchResult {
    fetcher.fetch(ProfileKind::AvatarValidation, url, FetchMode::Get).await
}

/// Outcome of importing an avatar from a URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarImport {
    pub accepted: bool,
    /// URL to persist on the user record when accepted.
    pub avatar_url: Option<String>,
    pub message: String,
    pub fetch: FetchResult,
}

fn acceptable_avatar_type(content_type: &str) -> bool {
    ["image/", "text/", "application/"]
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}

/// Blind avatar import: fetch, then accept on 2xx with a permissive content type.
pub async fn import_avatar(fetcher: &OutboundFetcher, url: &str) -> AvatarImport {
    let fetch = fetcher.fetch(ProfileKind::AvatarImport, url, FetchMode::Get).await;

    let (accepted, message) = match &fetch.outcome {
        FetchOutcome::Success {
            http_code,
            content_type,
            content_length,
            response_body,
            ..
        } => {
            if !(200..300).contains(http_code) {
                (false, format!("Failed to fetch image. HTTP {}: {}", http_code, response_body))
            } else {
                match content_type.as_deref() {
                    Some(ct) if acceptable_avatar_type(ct) => (
                        true,
                        format!("Image validated and saved. Type: {}, Size: {} bytes", ct, content_length),
                    ),
                    other => (
                        false,
                        format!("Invalid content type: {}", other.unwrap_or("none")),
                    ),
                }
            }
        }
        FetchOutcome::Error { message, .. } => (false, format!("Error fetching image: {}", message)),
    };

    AvatarImport {
        accepted,
        avatar_url: accepted.then(|| url.to_string()),
        message,
        fetch,
    }
}

/// Outcome of a registration-time email domain check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDomainCheck {
    pub domain: String,
    pub validation: FetchResult,
    /// Present when the domain check answered with a status of 400 or more.
    pub mx_fallback: Option<FetchResult>,
}

/// Everything after the first `@`, or the whole input when there is none.
pub fn email_domain(email: &str) -> &str {
    email.split_once('@').map_or(email, |(_, domain)| domain)
}

/// POST to the domain's validation endpoint; on a 4xx/5xx answer, try the
/// MX check endpoint. Never fails registration.
pub async fn validate_email_domain(
    fetcher: &OutboundFetcher,
    email: &str,
    username: &str,
) -> EmailDomainCheck {
    let domain = email_domain(email).to_string();
    let payload = json!({
        "email": email,
        "username": username,
        "validation_purpose": "user_registration",
    });

    let validation_url = format!("http://{}/api/email/validate", domain);
    let validation = fetcher
        .fetch(ProfileKind::EmailDomain, &validation_url, FetchMode::Post(payload))
        .await;

    let mx_fallback = match validation.http_code() {
        Some(code) if code >= 400 => {
            let mx_url = format!("http://{}:25/mx/check", domain);
            Some(fetcher.fetch(ProfileKind::MxCheck, &mx_url, FetchMode::Get).await)
        }
        _ => None,
    };

    let mx_status = mx_fallback
        .as_ref()
        .map(FetchResult::status_label)
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(
        domain = %domain,
        validation = %validation.status_label(),
        mx_fallback = %mx_status,
        "Email domain checked"
    );

    EmailDomainCheck {
        domain,
        validation,
        mx_fallback,
    }
}

/// POST a JSON payload to a webhook URL.
pub async fn deliver_webhook(
    fetcher: &OutboundFetcher,
    url: &str,
    payload: serde_json::Value,
) -> FetchResult {
    fetcher.fetch(ProfileKind::Webhook, url, FetchMode::Post(payload)).await
}
