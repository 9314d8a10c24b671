//! Request logging stage.
//!
//! Records every request entering the gateway and the status the backend
//! returned. Never terminates.

use axum::http::{header, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::config::RequestLogConfig;
use crate::pipeline::{Advisory, Filter, FilterDecision, RequestContext};

pub struct RequestLogStage {
    config: Arc<RequestLogConfig>,
}

impl RequestLogStage {
    pub fn new(config: Arc<RequestLogConfig>) -> Self {
        Self { config }
    }

    /// First `auth_preview_chars` characters of the Authorization value.
    fn authorization_preview(&self, value: &str) -> String {
        let preview: String = value.chars().take(self.config.auth_preview_chars).collect();
        format!("{}...", preview)
    }

    fn sensitive_fragment(&self, path: &str) -> Option<&str> {
        self.config
            .sensitive_paths
            .iter()
            .find(|fragment| path.contains(fragment.as_str()))
            .map(String::as_str)
    }
}

impl Filter for RequestLogStage {
    fn name(&self) -> &'static str {
        "request_log"
    }

    fn apply(&self, ctx: RequestContext) -> FilterDecision {
        let user_agent = ctx
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let authorization = ctx.authorization().map(|v| self.authorization_preview(v));

        tracing::info!(
            request_id = %ctx.request_id(),
            received_at = %ctx.received_at().format("%Y-%m-%d %H:%M:%S"),
            method = %ctx.method(),
            path = %ctx.path(),
            query = ctx.query().unwrap_or(""),
            client_ip = %ctx.client_ip(),
            user_agent = %user_agent,
            authorization = authorization.as_deref().unwrap_or("-"),
            "Gateway request"
        );

        match self.sensitive_fragment(ctx.path()).map(str::to_string) {
            Some(fragment) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    fragment = %fragment,
                    "Potentially SSRF-prone endpoint accessed"
                );
                FilterDecision::Continue(ctx.with_advisory(Advisory::SensitiveEndpoint(fragment)))
            }
            None => FilterDecision::Continue(ctx),
        }
    }

    fn on_response(&self, ctx: &RequestContext, status: StatusCode, elapsed: Duration) {
        tracing::info!(
            request_id = %ctx.request_id(),
            path = %ctx.path(),
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            user = ctx.identity().map(|c| c.subject.as_str()).unwrap_or("-"),
            "Gateway response"
        );
    }
}
