//! In-process request counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared by the gateway handler and the operations API.
#[derive(Debug)]
pub struct GatewayStats {
    started_at: Instant,
    requests: AtomicU64,
    forwarded: AtomicU64,
    not_found: AtomicU64,
    auth_failures: AtomicU64,
    ssrf_blocks: AtomicU64,
    upstream_errors: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub forwarded: u64,
    pub not_found: u64,
    pub auth_failures: u64,
    pub ssrf_blocks: u64,
    pub upstream_errors: u64,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            ssrf_blocks: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a pipeline termination against the stage that produced it.
    pub fn record_termination(&self, stage: &str) {
        match stage {
            "authentication" => {
                self.auth_failures.fetch_add(1, Ordering::Relaxed);
            }
            "ssrf_detection" => {
                self.ssrf_blocks.fetch_add(1, Ordering::Relaxed);
            }
            other => tracing::debug!(stage = other, "Termination from uncounted stage"),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            requests: self.requests.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            ssrf_blocks: self.ssrf_blocks.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for GatewayStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminations_are_counted_by_stage() {
        let stats = GatewayStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_termination("authentication");
        stats.record_termination("ssrf_detection");
        stats.record_termination("request_log");
        stats.record_forwarded();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.auth_failures, 1);
        assert_eq!(snapshot.ssrf_blocks, 1);
        assert_eq!(snapshot.forwarded, 1);
        assert_eq!(snapshot.upstream_errors, 0);
    }
}
