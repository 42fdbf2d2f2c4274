//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler:
//!     → event.rs (LogEvent, per-request RequestLog, mirrored to tracing)
//!     → buffer.rs (shared LogBuffer, appended once per request)
//!     → detached flush after the response is committed
//!     → export.rs (mint assertion, entries:write via backoff)
//!
//! Local diagnostics:
//!     → logging.rs (tracing subscriber, pretty or JSON)
//!     → metrics.rs (counters, histograms, Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Export failures never reach the request path
//! - Events keep their recording order through the buffer
//! - Metrics are cheap (no-op without a recorder)

pub mod buffer;
pub mod event;
pub mod export;
pub mod logging;
pub mod metrics;

pub use buffer::{LocalSink, LogBuffer, LogSink};
pub use event::{LogEvent, RequestLog, Severity};
pub use export::{CloudLoggingExporter, ExportError};
