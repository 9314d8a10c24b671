//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Select pretty or JSON output
//! - Honor `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - Initialization is idempotent: a second call reports an error instead of panicking

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

pub use tracing_subscriber::util::TryInitError;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to pretty output.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    format!("edge_gateway={level},gatewayctl={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    match LogFormat::parse(&config.log_format) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    }
}
