//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Logging, metrics → Bind listeners → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Stop accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Reload config from disk
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listeners
//! - Listeners start last (traffic only when ready)
//! - A reload that fails validation keeps the running policy

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
