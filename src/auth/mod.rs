//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! PROXY_SERVICE_ACCOUNT (JSON)
//!     → credential.rs (ServiceAccountKey, redacted Debug)
//!     → token.rs (PEM → PKCS#8 → RS256 signature)
//!     → BearerAssertion for the log export call
//! ```
//!
//! # Security Constraints
//! - The private key is never logged
//! - Assertions expire one hour after issue and are never reused

pub mod credential;
pub mod token;

pub use credential::ServiceAccountKey;
pub use token::{BearerAssertion, Claims, InvalidCredential, TokenMinter};
