//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate path prefix)
//!     → Return: matched Route (backend + pipeline) or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Sort by priority
//!     → Compile matcher, backend authority and pipeline per route
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled once per config, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by priority, then declaration order)

pub mod matcher;
pub mod router;

pub use router::{Route, Router};
