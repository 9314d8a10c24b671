//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request-id, limits, tracing)
//!     → request.rs (request-id lookup)
//!     → routing (match route → backend + pipeline)
//!     → pipeline (log → authenticate → screen)
//!     → server.rs (forward to backend) or response.rs (termination / gateway error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayRuntime, HttpServer};
