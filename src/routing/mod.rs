//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → matcher.rs (hostname, leading label, secret segment)
//!     → router.rs (Cdn | Api | NotFound | Unauthorized)
//!     → UpstreamTarget (origin + stripped path + query)
//! ```
//!
//! # Design Decisions
//! - Compiled at startup, immutable at runtime
//! - O(1) string operations per request, no regex
//! - Secret check first: nothing else is evaluated for unauthenticated requests

pub mod matcher;
pub mod router;

pub use matcher::SecretPrefix;
pub use router::{RouteDecision, RouteKind, Router, UpstreamTarget};
