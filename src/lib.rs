//! Edge Gateway Library
//!
//! An authenticating, SSRF-screening gateway in front of backend services,
//! plus the bounded outbound fetcher those services use for caller-supplied URLs.

// Core subsystems
pub mod config;
pub mod http;
pub mod pipeline;
pub mod routing;
pub mod security;

// Outbound
pub mod fetch;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
