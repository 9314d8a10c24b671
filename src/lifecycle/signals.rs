//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / SIGINT and trigger shutdown
//! - Reload the config file on SIGHUP
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers config reload, not shutdown

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::config::GatewayConfig;
use crate::lifecycle::Shutdown;

/// Resolve when the process is asked to stop.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received"),
        _ = terminate => tracing::info!("SIGTERM received"),
    }
}

/// Trigger `shutdown` on the first stop signal.
pub fn spawn_shutdown_on_signal(shutdown: Shutdown) {
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });
}

/// Reload `path` on every SIGHUP and send valid configs to the server.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(path: PathBuf, updates: mpsc::UnboundedSender<GatewayConfig>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGHUP");
                return;
            }
        };
        while hangups.recv().await.is_some() {
            tracing::info!(path = ?path, "SIGHUP received, reloading config");
            if !crate::config::watcher::reload(&path, &updates) {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(_path: PathBuf, _updates: mpsc::UnboundedSender<GatewayConfig>) {}
