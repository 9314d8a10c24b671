//! Gateway filter pipeline.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → logging.rs (record, flag sensitive paths; never terminates)
//!     → auth.rs (verify bearer token; may terminate 401)
//!     → ssrf.rs (screen query; may terminate 403)
//!     → Continue(context) → forwarded by http::server
//!
//! After the backend answers:
//!     Pipeline::observe_response → each stage, in reverse order
//! ```
//!
//! # Design Decisions
//! - Stages run strictly in order; the first `Terminate` ends the run
//! - Stages are synchronous and hold only read-only tables
//! - A route may omit stages but never reorder them

pub mod auth;
pub mod context;
pub mod logging;
pub mod ssrf;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GatewayConfig, RequestLogConfig};
use crate::security::{JwtVerifier, SsrfDetector};

pub use auth::AuthenticationStage;
pub use context::{Advisory, RequestContext};
pub use logging::RequestLogStage;
pub use ssrf::SsrfStage;

/// Final response produced by a stage that stops the pipeline.
#[derive(Debug, Clone)]
pub struct Termination {
    pub status: StatusCode,
    pub body: String,
    pub headers: HeaderMap,
    /// Name of the stage that terminated.
    pub stage: &'static str,
}

impl Termination {
    /// JSON error body `{"error": .., "status": ..}` plus an optional reason code.
    pub fn new(stage: &'static str, status: StatusCode, message: &str, reason: Option<&str>) -> Self {
        let mut body = json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let Some(reason) = reason {
            body["reason"] = json!(reason);
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            status,
            body: body.to_string(),
            headers,
            stage,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }
}

/// Result of one stage.
#[derive(Debug)]
pub enum FilterDecision {
    Continue(RequestContext),
    Terminate(Termination),
}

/// One interceptor in the pipeline.
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: RequestContext) -> FilterDecision;

    /// Called with the backend status after forwarding. Must not alter the response.
    fn on_response(&self, _ctx: &RequestContext, _status: StatusCode, _elapsed: Duration) {}
}

/// Shared, read-only components the stages are built from.
#[derive(Clone)]
pub struct Stages {
    pub request_log: Arc<RequestLogConfig>,
    pub verifier: Arc<JwtVerifier>,
    pub detector: Arc<SsrfDetector>,
}

impl Stages {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            request_log: Arc::new(config.request_log.clone()),
            verifier: Arc::new(JwtVerifier::new(&config.auth)),
            detector: Arc::new(SsrfDetector::new(&config.ssrf)),
        }
    }
}

/// Ordered list of stages.
#[derive(Default)]
pub struct Pipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Logging → Authentication → SSRF detection, with optional stages dropped.
    pub fn standard(stages: &Stages, authenticate: bool, ssrf_protection: bool) -> Self {
        let mut pipeline = Pipeline::new().with(RequestLogStage::new(stages.request_log.clone()));
        if authenticate {
            pipeline = pipeline.with(AuthenticationStage::new(stages.verifier.clone()));
        }
        if ssrf_protection {
            pipeline = pipeline.with(SsrfStage::new(stages.detector.clone()));
        }
        pipeline
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every stage in order until one terminates.
    pub fn run(&self, ctx: RequestContext) -> FilterDecision {
        let mut ctx = ctx;
        for filter in &self.filters {
            match filter.apply(ctx) {
                FilterDecision::Continue(next) => ctx = next,
                FilterDecision::Terminate(termination) => {
                    tracing::debug!(
                        stage = filter.name(),
                        status = %termination.status,
                        "Pipeline terminated"
                    );
                    return FilterDecision::Terminate(termination);
                }
            }
        }
        FilterDecision::Continue(ctx)
    }

    /// Let stages observe the backend status, innermost first.
    pub fn observe_response(&self, ctx: &RequestContext, status: StatusCode, elapsed: Duration) {
        for filter in self.filters.iter().rev() {
            filter.on_response(ctx, status, elapsed);
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::headers::{X_SSRF_PROTECTION, X_USER_ROLE, X_USER_USERNAME};
    use crate::security::{JwtIssuer, Role};
    use axum::http::{Method, Uri};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.secret = "pipeline-test-secret".into();
        config
    }

    fn request(uri: &str, authorization: Option<&str>) -> RequestContext {
        let uri: Uri = uri.parse().unwrap();
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        RequestContext::new(Method::GET, &uri, headers, Some("203.0.113.4:5000".parse().unwrap()))
    }

    fn bearer(config: &GatewayConfig, subject: &str, role: Role) -> String {
        format!("Bearer {}", JwtIssuer::new(&config.auth).issue(subject, role).unwrap())
    }

    #[test]
    fn test_missing_authorization_terminates_401() {
        let config = config();
        let pipeline = Pipeline::standard(&Stages::from_config(&config), true, true);

        match pipeline.run(request("/api/users/me", None)) {
            FilterDecision::Terminate(t) => {
                assert_eq!(t.status, StatusCode::UNAUTHORIZED);
                assert_eq!(t.stage, "authentication");
                assert!(t.body.contains("Missing Authorization header"));
                assert!(t.headers.get(&X_USER_USERNAME).is_none());
            }
            FilterDecision::Continue(_) => panic!("request without credentials must terminate"),
        }
    }

    #[test]
    fn test_valid_token_continues_with_identity() {
        let config = config();
        let pipeline = Pipeline::standard(&Stages::from_config(&config), true, true);
        let auth = bearer(&config, "alice", Role::Admin);

        match pipeline.run(request("/api/users/me", Some(&auth))) {
            FilterDecision::Continue(ctx) => {
                let headers = ctx.forward_headers();
                assert_eq!(headers[&X_USER_USERNAME], "alice");
                assert_eq!(headers[&X_USER_ROLE], "ADMIN");
            }
            FilterDecision::Terminate(t) => panic!("unexpected termination: {}", t.body),
        }
    }

    #[test]
    fn test_ssrf_block_after_authentication() {
        let config = config();
        let pipeline = Pipeline::standard(&Stages::from_config(&config), true, true);
        let auth = bearer(&config, "alice", Role::User);

        match pipeline.run(request("/api/users/me/avatar?image_url=http://localhost/x", Some(&auth))) {
            FilterDecision::Terminate(t) => {
                assert_eq!(t.status, StatusCode::FORBIDDEN);
                assert_eq!(t.headers[&X_SSRF_PROTECTION], "blocked");
                assert!(t.body.contains("suspicious_url_pattern"));
            }
            FilterDecision::Continue(_) => panic!("localhost URL must be blocked"),
        }
    }

    #[test]
    fn test_auth_runs_before_ssrf() {
        let config = config();
        let pipeline = Pipeline::standard(&Stages::from_config(&config), true, true);

        match pipeline.run(request("/fetch?url=http://localhost/", None)) {
            FilterDecision::Terminate(t) => assert_eq!(t.status, StatusCode::UNAUTHORIZED),
            FilterDecision::Continue(_) => panic!("must terminate"),
        }
    }

    #[test]
    fn test_public_route_skips_authentication() {
        let config = config();
        let pipeline = Pipeline::standard(&Stages::from_config(&config), false, true);
        assert_eq!(pipeline.stage_names(), vec!["request_log", "ssrf_detection"]);

        match pipeline.run(request("/api/auth/login", None)) {
            FilterDecision::Continue(ctx) => {
                assert!(ctx.identity().is_none());
                assert!(ctx.forward_headers().get(&X_USER_USERNAME).is_none());
            }
            FilterDecision::Terminate(_) => panic!("public route must continue"),
        }
    }

    #[test]
    fn test_high_risk_path_continues_with_advisories() {
        let config = config();
        let pipeline = Pipeline::standard(&Stages::from_config(&config), false, true);

        match pipeline.run(request("/api/users/me/avatar/validate", None)) {
            FilterDecision::Continue(ctx) => {
                assert!(ctx
                    .advisories()
                    .contains(&Advisory::HighRiskEndpoint("/avatar/validate".into())));
                assert!(ctx
                    .advisories()
                    .contains(&Advisory::SensitiveEndpoint("avatar".into())));
            }
            FilterDecision::Terminate(_) => panic!("path alone must not block"),
        }
    }

    struct Counting {
        name: &'static str,
        seen: Arc<AtomicUsize>,
        stop: bool,
    }

    impl Filter for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn apply(&self, ctx: RequestContext) -> FilterDecision {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.stop {
                FilterDecision::Terminate(Termination::new(self.name, StatusCode::IM_A_TEAPOT, "stop", None))
            } else {
                FilterDecision::Continue(ctx)
            }
        }
    }

    #[test]
    fn test_short_circuit_skips_later_stages() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with(Counting { name: "first", seen: first.clone(), stop: true })
            .with(Counting { name: "second", seen: second.clone(), stop: false });

        assert!(matches!(pipeline.run(request("/", None)), FilterDecision::Terminate(_)));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }
}
