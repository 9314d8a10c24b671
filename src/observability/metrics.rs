//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, rejections, outbound fetches)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_auth_failures_total` (counter): authentication failures by kind
//! - `gateway_ssrf_blocks_total` (counter): SSRF blocks by reason code
//! - `gateway_outbound_fetch_total` (counter): outbound fetches by profile, status

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    describe_counter!("gateway_requests_total", "Requests handled by the gateway");
    describe_histogram!(
        "gateway_request_duration_seconds",
        "Time from request arrival to response"
    );
    describe_counter!("gateway_auth_failures_total", "Requests rejected by authentication");
    describe_counter!("gateway_ssrf_blocks_total", "Requests rejected by SSRF detection");
    describe_counter!("gateway_outbound_fetch_total", "Outbound fetches performed");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_auth_failure(kind: &'static str) {
    counter!("gateway_auth_failures_total", "kind" => kind).increment(1);
}

pub fn record_ssrf_block(reason: &'static str) {
    counter!("gateway_ssrf_blocks_total", "reason" => reason).increment(1);
}

/// `status` is the HTTP status code or an error kind.
pub fn record_outbound_fetch(profile: &str, status: &str) {
    counter!(
        "gateway_outbound_fetch_total",
        "profile" => profile.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
