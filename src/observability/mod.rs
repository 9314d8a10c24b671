//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages, server, fetcher produce:
//!     → logging.rs (structured log events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metrics are cheap (atomic increments); a missing recorder makes them no-ops
//! - Authorization values are never logged beyond a short preview

pub mod logging;
pub mod metrics;
