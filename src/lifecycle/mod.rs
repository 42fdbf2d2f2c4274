//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build client and log sink → Start listener
//!
//! Per request (tasks.rs):
//!     Response returned → log shipping spawned as a tracked background task
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Finish in-flight requests
//!     → Drain background tasks (bounded) → Final log flush → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast on bad configuration
//! - Shutdown has a deadline: background work is abandoned after `drain_secs`

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod tasks;

pub use shutdown::Shutdown;
pub use tasks::BackgroundTasks;
