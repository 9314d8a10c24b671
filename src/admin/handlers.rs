use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::stats::StatsSnapshot;
use crate::config::{FetchConfig, RequestLogConfig, SsrfConfig};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub routes: usize,
}

#[derive(Debug, Serialize)]
pub struct RoutePolicy {
    pub name: String,
    pub path_prefix: String,
    pub backend: String,
    pub priority: u32,
    pub stages: Vec<&'static str>,
}

/// The policy the gateway is currently enforcing.
#[derive(Debug, Serialize)]
pub struct ActivePolicy {
    pub routes: Vec<RoutePolicy>,
    pub ssrf: SsrfConfig,
    pub request_log: RequestLogConfig,
    pub fetch: FetchConfig,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.inner.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.stats.snapshot().uptime_secs,
        routes: inner.router.routes().len(),
    })
}

pub async fn get_policy(State(state): State<AppState>) -> Json<ActivePolicy> {
    let inner = state.inner.load_full();
    let routes = inner
        .router
        .routes()
        .iter()
        .map(|route| RoutePolicy {
            name: route.name.clone(),
            path_prefix: route.path_prefix().to_string(),
            backend: route.backend.to_string(),
            priority: route.priority,
            stages: route.pipeline.stage_names(),
        })
        .collect();

    Json(ActivePolicy {
        routes,
        ssrf: inner.config.ssrf.clone(),
        request_log: inner.config.request_log.clone(),
        fetch: inner.config.fetch.clone(),
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
