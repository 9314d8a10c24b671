//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping path prefixes to backends.
    pub routes: Vec<RouteConfig>,

    /// Bearer token verification settings.
    pub auth: AuthConfig,

    /// SSRF screening tables.
    pub ssrf: SsrfConfig,

    /// Request logging stage settings.
    pub request_log: RequestLogConfig,

    /// Outbound fetch validator settings.
    pub fetch: FetchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Operations API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route configuration mapping a path prefix to one backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Backend authority (e.g., "user-service:8081").
    pub backend: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,

    /// Run the authentication stage for this route.
    #[serde(default = "default_true")]
    pub authenticate: bool,

    /// Run the SSRF detection stage for this route.
    #[serde(default = "default_true")]
    pub ssrf_protection: bool,
}

fn default_true() -> bool {
    true
}

/// Default token secret; startup warns while it is in use.
pub const PLACEHOLDER_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Bearer token settings (HS256).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret.
    pub secret: String,

    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,

    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: u64,

    /// Clock skew tolerated when checking `exp`.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: PLACEHOLDER_SECRET.to_string(),
            issuer: None,
            token_ttl_secs: 86_400,
            leeway_secs: 0,
        }
    }
}

/// Tables used by the SSRF heuristic detector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SsrfConfig {
    /// Query fragments that mark a URL-carrying parameter.
    pub parameter_markers: Vec<String>,

    /// Substrings that block a triggered query.
    pub denylist: Vec<String>,

    /// Path fragments flagged for heightened logging (never blocked by path alone).
    pub high_risk_paths: Vec<String>,
}

impl Default for SsrfConfig {
    fn default() -> Self {
        Self {
            parameter_markers: strings(&[
                "url=",
                "image_url=",
                "compare_url=",
                "review_url=",
                "share_api_url=",
                "callback=",
                "redirect=",
            ]),
            denylist: strings(&[
                "localhost",
                "127.0.0.1",
                "0.0.0.0",
                "169.254.169.254",
                "metadata.google.internal",
                "192.168.",
                "10.",
                "172.",
                "service",
                "postgres",
                "docker",
                "internal",
            ]),
            high_risk_paths: strings(&["/avatar/validate", "/check_price", "/fetch_review", "/share"]),
        }
    }
}

/// Logging stage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLogConfig {
    /// Path fragments that raise an advisory log line.
    pub sensitive_paths: Vec<String>,

    /// Characters of the Authorization value kept in logs.
    pub auth_preview_chars: usize,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            sensitive_paths: strings(&[
                "avatar",
                "validate",
                "check_price",
                "fetch_review",
                "share",
                "shipping",
                "warranty",
            ]),
            auth_preview_chars: 20,
        }
    }
}

/// Outbound fetch validator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Product token prefixed to every profile's user agent.
    pub user_agent: String,

    /// Hard cap on captured body bytes, independent of the line cap.
    pub max_body_bytes: usize,

    /// Interactive avatar URL validation.
    pub avatar_validation: FetchProfileConfig,

    /// Blind avatar import.
    pub avatar_import: FetchProfileConfig,

    /// Registration-time email domain check.
    pub email_domain: FetchProfileConfig,

    /// Fallback MX check after a failed domain check.
    pub mx_check: FetchProfileConfig,

    /// Webhook delivery.
    pub webhook: FetchProfileConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "EdgeGateway/1.0".to_string(),
            max_body_bytes: 256 * 1024,
            avatar_validation: FetchProfileConfig::new("AvatarValidator", 10_000, 50),
            avatar_import: FetchProfileConfig::new("AvatarUploader", 5_000, 10),
            email_domain: FetchProfileConfig::new("EmailValidator", 3_000, 10),
            mx_check: FetchProfileConfig::new("MxValidator", 2_000, 10),
            webhook: FetchProfileConfig::new("WebhookNotifier", 10_000, 10),
        }
    }
}

/// Per call-site fetch bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchProfileConfig {
    /// User agent suffix identifying the call site.
    pub agent: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,

    /// Maximum number of body lines captured.
    pub max_lines: usize,
}

impl FetchProfileConfig {
    fn new(agent: &str, timeout_ms: u64, max_lines: usize) -> Self {
        Self {
            agent: agent.to_string(),
            connect_timeout_ms: timeout_ms,
            read_timeout_ms: timeout_ms,
            max_lines,
        }
    }
}

/// Timeout configuration for gateway operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall request timeout in seconds.
    pub request_secs: u64,

    /// Timeout for the forwarded backend call in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 25,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Operations API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the operations API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Operations API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
