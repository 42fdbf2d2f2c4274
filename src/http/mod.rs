//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID, body buffering)
//!     → [routing decides Cdn | Api | NotFound | Unauthorized]
//!     → client.rs (upstream leg under backoff)
//!     → response.rs (pass through, or rewrite settings)
//!     → Send to client
//! ```

pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use client::{UpstreamClient, UpstreamRequest};
pub use error::{ProxyError, UpstreamBodyError};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
