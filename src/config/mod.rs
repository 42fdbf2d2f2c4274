//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional, path in PROXY_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PROXY_* variables, service-account JSON)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no ambient lookups after startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ExportConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ProxyConfig;
pub use schema::RetryConfig;
pub use schema::RoutingConfig;
