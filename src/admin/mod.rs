//! Operations API.
//!
//! # Data Flow
//! ```text
//! Operator request (separate listener)
//!     → security::access_control::internal_only (network origin must be Internal)
//!     → auth.rs (bearer API key)
//!     → handlers.rs (status, active policy, counters)
//! ```

pub mod auth;
pub mod handlers;
pub mod stats;

use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;
use crate::security::access_control::internal_only;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/policy", get(get_policy))
        .route("/admin/stats", get(get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(middleware::from_fn(internal_only))
        .with_state(state)
}

/// Serve the operations API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    let app = setup_admin_router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
