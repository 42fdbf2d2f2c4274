//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → routing (secret path segment gate, fail closed with 401)
//!     → headers.rs (strip hop-by-hop and Host before forwarding)
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop, CORS on rewritten settings)
//! ```
//!
//! # Design Decisions
//! - The secret segment is the only authentication; it is never logged
//! - Inbound bodies are size-limited before buffering

pub mod headers;
