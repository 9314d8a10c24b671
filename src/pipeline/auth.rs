//! Authentication stage.
//!
//! Verifies the bearer token and attaches typed claims to the context.
//! Every failure terminates with 401 and the failure reason in the body.

use axum::http::StatusCode;
use std::sync::Arc;

use crate::observability::metrics;
use crate::pipeline::{Filter, FilterDecision, RequestContext, Termination};
use crate::security::JwtVerifier;

pub struct AuthenticationStage {
    verifier: Arc<JwtVerifier>,
}

impl AuthenticationStage {
    pub fn new(verifier: Arc<JwtVerifier>) -> Self {
        Self { verifier }
    }
}

impl Filter for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn apply(&self, ctx: RequestContext) -> FilterDecision {
        match self.verifier.verify(ctx.authorization()) {
            Ok(claims) => {
                tracing::info!(
                    request_id = %ctx.request_id(),
                    user = %claims.subject,
                    role = %claims.role,
                    "User authenticated"
                );
                FilterDecision::Continue(ctx.with_identity(claims))
            }
            Err(failure) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    client_ip = %ctx.client_ip(),
                    reason = %failure,
                    "Authentication failed"
                );
                metrics::record_auth_failure(failure.kind());
                FilterDecision::Terminate(Termination::new(
                    self.name(),
                    StatusCode::UNAUTHORIZED,
                    &failure.to_string(),
                    Some(failure.kind()),
                ))
            }
        }
    }
}
