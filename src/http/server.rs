//! HTTP server setup and request forwarding.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all gateway handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener and shut down gracefully
//! - Dispatch requests to the routing engine and the route's pipeline
//! - Forward continued requests to the matched backend
//! - Swap the compiled runtime when a new config arrives

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, uri::Authority, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::stats::GatewayStats;
use crate::config::GatewayConfig;
use crate::http::response::error_response;
use crate::observability::metrics;
use crate::pipeline::{FilterDecision, RequestContext, Stages};
use crate::routing::Router as ProxyRouter;

/// Everything compiled from one config: routes, pipelines, tables.
///
/// A request loads one snapshot and keeps it until it finishes.
#[derive(Debug)]
pub struct GatewayRuntime {
    pub config: Arc<GatewayConfig>,
    pub router: ProxyRouter,
}

impl GatewayRuntime {
    pub fn compile(config: GatewayConfig) -> Self {
        let stages = Stages::from_config(&config);
        let router = ProxyRouter::from_config(&config.routes, &stages);
        Self {
            config: Arc::new(config),
            router,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<GatewayRuntime>>,
    pub client: Client<HttpConnector, Body>,
    pub stats: Arc<GatewayStats>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            inner: Arc::new(ArcSwap::from_pointee(GatewayRuntime::compile(config))),
            client,
            stats: Arc::new(GatewayStats::new()),
        }
    }

    /// Replace the active runtime. In-flight requests keep their snapshot.
    pub fn reload(&self, config: GatewayConfig) {
        let runtime = GatewayRuntime::compile(config);
        tracing::info!(routes = runtime.router.routes().len(), "Gateway policy reloaded");
        self.inner.store(Arc::new(runtime));
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState::new(config.clone());
        let router = Self::build_router(&config, state.clone());
        Self { router, state }
    }

    /// Shared state, for the operations API.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Timeout and body limit are fixed at startup; a reload does not change them.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.reload(config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gateway handler.
/// Looks up the route, runs its pipeline, and forwards what continues.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let runtime = state.inner.load_full();
    state.stats.record_request();

    let (parts, body) = request.into_parts();

    let route = match runtime.router.match_path(parts.uri.path()) {
        Some(route) => route,
        None => {
            tracing::warn!(path = %parts.uri.path(), "No route matched");
            state.stats.record_not_found();
            metrics::record_request("none", 404, start);
            return error_response(StatusCode::NOT_FOUND, "No matching route found");
        }
    };

    let ctx = match route.pipeline.run(RequestContext::from_parts(&parts, Some(peer))) {
        FilterDecision::Continue(ctx) => ctx,
        FilterDecision::Terminate(termination) => {
            state.stats.record_termination(termination.stage);
            metrics::record_request(&route.name, termination.status.as_u16(), start);
            return termination.into_response();
        }
    };

    let uri = match upstream_uri(&route.backend, &ctx.path_and_query()) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %ctx.request_id(), error = %e, "Cannot build upstream URI");
            metrics::record_request(&route.name, 400, start);
            return error_response(StatusCode::BAD_REQUEST, "Invalid request target");
        }
    };

    let mut upstream = Request::new(body);
    *upstream.method_mut() = ctx.method().clone();
    *upstream.uri_mut() = uri;
    *upstream.headers_mut() = ctx.forward_headers();
    upstream.headers_mut().remove(header::HOST);

    tracing::debug!(
        request_id = %ctx.request_id(),
        route = %route.name,
        backend = %route.backend,
        "Forwarding request"
    );

    let upstream_timeout = Duration::from_secs(runtime.config.timeouts.upstream_secs);
    let response = match tokio::time::timeout(upstream_timeout, state.client.request(upstream)).await {
        Ok(Ok(response)) => {
            state.stats.record_forwarded();
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %ctx.request_id(), backend = %route.backend, error = %e, "Upstream error");
            state.stats.record_upstream_error();
            error_response(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
        Err(_) => {
            tracing::error!(
                request_id = %ctx.request_id(),
                backend = %route.backend,
                timeout_secs = upstream_timeout.as_secs(),
                "Upstream timed out"
            );
            state.stats.record_upstream_error();
            error_response(StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out")
        }
    };

    route.pipeline.observe_response(&ctx, response.status(), start.elapsed());
    metrics::record_request(&route.name, response.status().as_u16(), start);
    response
}

fn upstream_uri(backend: &Authority, path_and_query: &str) -> Result<Uri, axum::http::Error> {
    Uri::builder()
        .scheme("http")
        .authority(backend.clone())
        .path_and_query(path_and_query)
        .build()
}
