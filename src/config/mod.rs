//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into a GatewayRuntime (routes, pipelines, tables)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the compiled runtime atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - A request keeps the runtime snapshot it started with

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::AdminConfig;
pub use schema::AuthConfig;
pub use schema::FetchConfig;
pub use schema::FetchProfileConfig;
pub use schema::GatewayConfig;
pub use schema::ObservabilityConfig;
pub use schema::RequestLogConfig;
pub use schema::RouteConfig;
pub use schema::SsrfConfig;
