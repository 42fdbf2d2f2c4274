//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (proxy upstream leg or log export):
//!     → retries.rs (attempt, classify status / transport failure)
//!     → backoff.rs (linear delay before the next attempt)
//!     → last response, or RetryableFetchTimeout
//! ```
//!
//! # Design Decisions
//! - One policy type shared by every outbound call
//! - 4xx/3xx/2xx are final; only transport failures and 5xx are retried
//! - No per-attempt timeout: the step budget is the only bound

pub mod backoff;
pub mod retries;

pub use backoff::{BackoffPolicy, InvalidPolicy};
pub use retries::{retryable_fetch, FetchError, UpstreamStatus};
