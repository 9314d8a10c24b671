//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (derive client IP, strip caller identity headers)
//!     → token.rs (verify bearer token → IdentityClaims)
//!     → ssrf.rs (screen path + query)
//!     → headers.rs (inject verified identity headers)
//!     → Pass to backend
//!
//! Internal-only routes:
//!     → access_control.rs (origin.rs classification of the client IP)
//! ```
//!
//! # Design Decisions
//! - Tables and keys are immutable once built; no locking on the request path
//! - Every check is a pure function of its input
//! - No trust in client-supplied identity headers

pub mod access_control;
pub mod headers;
pub mod origin;
pub mod ssrf;
pub mod token;

pub use origin::{classify, NetworkClass};
pub use ssrf::{BlockReason, ScanVerdict, SsrfDetector};
pub use token::{AuthFailure, IdentityClaims, JwtIssuer, JwtVerifier, Role};
