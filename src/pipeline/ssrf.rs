//! SSRF detection stage.
//!
//! Applies the heuristic detector to the authenticated request. Blocks
//! terminate with 403 and `X-SSRF-Protection: blocked`.

use axum::http::StatusCode;
use std::sync::Arc;

use crate::observability::metrics;
use crate::pipeline::{Advisory, Filter, FilterDecision, RequestContext, Termination};
use crate::security::headers::{SSRF_BLOCKED, X_SSRF_PROTECTION};
use crate::security::{ScanVerdict, SsrfDetector};

pub struct SsrfStage {
    detector: Arc<SsrfDetector>,
}

impl SsrfStage {
    pub fn new(detector: Arc<SsrfDetector>) -> Self {
        Self { detector }
    }
}

impl Filter for SsrfStage {
    fn name(&self) -> &'static str {
        "ssrf_detection"
    }

    fn apply(&self, ctx: RequestContext) -> FilterDecision {
        match self.detector.scan(ctx.path(), ctx.query()) {
            ScanVerdict::Block(reason) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    query = ctx.query().unwrap_or(""),
                    client_ip = %ctx.client_ip(),
                    reason = %reason,
                    "SSRF protection blocked request"
                );
                metrics::record_ssrf_block(reason.code());
                FilterDecision::Terminate(
                    Termination::new(
                        self.name(),
                        StatusCode::FORBIDDEN,
                        &reason.to_string(),
                        Some(reason.code()),
                    )
                    .with_header(X_SSRF_PROTECTION, SSRF_BLOCKED),
                )
            }
            ScanVerdict::Allow { high_risk: Some(fragment) } => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    fragment = %fragment,
                    "Known SSRF-prone endpoint, additional monitoring enabled"
                );
                FilterDecision::Continue(ctx.with_advisory(Advisory::HighRiskEndpoint(fragment)))
            }
            ScanVerdict::Allow { high_risk: None } => {
                tracing::debug!(request_id = %ctx.request_id(), "Request passed SSRF checks");
                FilterDecision::Continue(ctx)
            }
        }
    }
}
