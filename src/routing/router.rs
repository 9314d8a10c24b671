//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Explicit NoMatch rather than silent default

use axum::http::uri::Authority;
use std::sync::Arc;

use crate::config::RouteConfig;
use crate::pipeline::{Pipeline, Stages};
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub backend: Authority,
    pub priority: u32,
    pub pipeline: Arc<Pipeline>,
    matcher: PathPrefixMatcher,
}

impl Route {
    pub fn path_prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

/// Ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile routes from config. Routes whose backend does not parse are
    /// skipped; validation rejects them before this point.
    pub fn from_config(configs: &[RouteConfig], stages: &Stages) -> Self {
        let mut routes: Vec<Route> = configs
            .iter()
            .filter_map(|config| {
                let backend = match config.backend.parse::<Authority>() {
                    Ok(authority) => authority,
                    Err(e) => {
                        tracing::error!(route = %config.name, backend = %config.backend, error = %e, "Skipping route with invalid backend");
                        return None;
                    }
                };
                Some(Route {
                    name: config.name.clone(),
                    backend,
                    priority: config.priority,
                    pipeline: Arc::new(Pipeline::standard(
                        stages,
                        config.authenticate,
                        config.ssrf_protection,
                    )),
                    matcher: PathPrefixMatcher::new(config.path_prefix.clone()),
                })
            })
            .collect();

        // Stable sort keeps declaration order among equal priorities
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        for route in &routes {
            tracing::debug!(
                route = %route.name,
                prefix = %route.path_prefix(),
                backend = %route.backend,
                stages = ?route.pipeline.stage_names(),
                "Route compiled"
            );
        }

        Self { routes }
    }

    /// First route whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn route(name: &str, prefix: &str, priority: u32, authenticate: bool) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path_prefix: prefix.into(),
            backend: "user-service:8081".into(),
            priority,
            authenticate,
            ssrf_protection: true,
        }
    }

    fn stages() -> Stages {
        Stages::from_config(&GatewayConfig::default())
    }

    #[test]
    fn test_priority_then_declaration_order() {
        let router = Router::from_config(
            &[
                route("users", "/api/users", 0, true),
                route("auth", "/api/auth", 10, false),
                route("fallback", "/", 0, true),
                route("users-shadow", "/api/users", 0, true),
            ],
            &stages(),
        );

        let names: Vec<_> = router.routes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["auth", "users", "fallback", "users-shadow"]);

        assert_eq!(router.match_path("/api/auth/login").unwrap().name, "auth");
        assert_eq!(router.match_path("/api/users/me").unwrap().name, "users");
        assert_eq!(router.match_path("/api/products").unwrap().name, "fallback");
    }

    #[test]
    fn test_no_match() {
        let router = Router::from_config(&[route("users", "/api/users", 0, true)], &stages());
        assert!(router.match_path("/health").is_none());
    }

    #[test]
    fn test_per_route_pipeline() {
        let router = Router::from_config(
            &[route("auth", "/api/auth", 0, false), route("users", "/api/users", 0, true)],
            &stages(),
        );
        let auth = router.match_path("/api/auth/login").unwrap();
        assert_eq!(auth.pipeline.stage_names(), vec!["request_log", "ssrf_detection"]);

        let users = router.match_path("/api/users").unwrap();
        assert_eq!(
            users.pipeline.stage_names(),
            vec!["request_log", "authentication", "ssrf_detection"]
        );
        assert_eq!(users.backend.as_str(), "user-service:8081");
    }

    #[test]
    fn test_invalid_backend_is_skipped() {
        let mut bad = route("bad", "/bad", 0, true);
        bad.backend = "not a host".into();
        let router = Router::from_config(&[bad], &stages());
        assert!(router.routes().is_empty());
    }
}
