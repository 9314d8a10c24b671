//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start background tasks (config watcher, signal handlers, admin API)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::admin;
use crate::config::loader::{load_config, ConfigError};
use crate::config::watcher::ConfigWatcher;
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::signals;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] logging::TryInitError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("config watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error("bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the config at `path`, or defaults when no path is given.
pub fn resolve_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(GatewayConfig::default()),
    }
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

/// Run the gateway until a stop signal arrives.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), StartupError> {
    let config = resolve_config(config_path.as_deref())?;
    logging::init_tracing(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.auth.secret == crate::config::schema::PLACEHOLDER_SECRET {
        tracing::warn!("auth.secret is the built-in placeholder; set a real secret");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    signals::spawn_shutdown_on_signal(shutdown.clone());

    // Hot reload: file watcher and SIGHUP feed the same channel
    let (config_updates, _watcher) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            signals::spawn_reload_on_hangup(path.clone(), watcher.sender());
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let admin_enabled = config.admin.enabled;
    let admin_address = config.admin.bind_address.clone();
    let server = HttpServer::new(config);

    if admin_enabled {
        let admin_listener = bind(&admin_address).await?;
        let state = server.state();
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(admin_listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        });
    }

    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
