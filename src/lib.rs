//! Edge proxy library.
//!
//! Gates requests on a secret path segment, dispatches them by subdomain to
//! the analytics CDN or API, and ships its own structured logs to a
//! Cloud-Logging-style backend using a self-signed RS256 assertion.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
