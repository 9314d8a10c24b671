//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route integrity (prefix shape, backend authority, unique names)
//! - Validate value ranges (timeouts > 0, line caps > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::uri::Authority;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{FetchProfileConfig, GatewayConfig};

/// A single semantic problem in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route '{route}': path_prefix '{prefix}' must start with '/'")]
    InvalidPathPrefix { route: String, prefix: String },

    #[error("route '{route}': backend '{backend}' is not a valid host:port authority")]
    InvalidBackend { route: String, backend: String },

    #[error("route name '{0}' is used more than once")]
    DuplicateRoute(String),

    #[error("auth.secret must not be empty")]
    EmptySecret,

    #[error("fetch.{profile}: {reason}")]
    InvalidFetchProfile { profile: &'static str, reason: &'static str },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("admin.api_key must not be empty when the admin API is enabled")]
    EmptyAdminKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPathPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }
        if route.backend.parse::<Authority>().is_err() || route.backend.contains('/') {
            errors.push(ValidationError::InvalidBackend {
                route: route.name.clone(),
                backend: route.backend.clone(),
            });
        }
        if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
    }

    if config.auth.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }

    let profiles: [(&'static str, &FetchProfileConfig); 5] = [
        ("avatar_validation", &config.fetch.avatar_validation),
        ("avatar_import", &config.fetch.avatar_import),
        ("email_domain", &config.fetch.email_domain),
        ("mx_check", &config.fetch.mx_check),
        ("webhook", &config.fetch.webhook),
    ];
    for (name, profile) in profiles {
        if profile.connect_timeout_ms == 0 || profile.read_timeout_ms == 0 {
            errors.push(ValidationError::InvalidFetchProfile {
                profile: name,
                reason: "timeouts must be greater than zero",
            });
        }
        if profile.max_lines == 0 {
            errors.push(ValidationError::InvalidFetchProfile {
                profile: name,
                reason: "max_lines must be greater than zero",
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::EmptyAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, prefix: &str, backend: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path_prefix: prefix.into(),
            backend: backend.into(),
            priority: 0,
            authenticate: true,
            ssrf_protection: true,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.routes.push(route("users", "api/users", "user-service:8081"));
        config.routes.push(route("users", "/api/users", "http://user-service/"));
        config.auth.secret.clear();
        config.fetch.webhook.max_lines = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::EmptySecret));
        assert!(errors.contains(&ValidationError::DuplicateRoute("users".into())));
        assert!(errors.contains(&ValidationError::InvalidFetchProfile {
            profile: "webhook",
            reason: "max_lines must be greater than zero",
        }));
    }

    #[test]
    fn test_admin_key_required_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.admin.api_key.clear();
        assert!(validate_config(&config).is_ok());

        config.admin.enabled = true;
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::EmptyAdminKey]);
    }
}
