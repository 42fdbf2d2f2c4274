//! Structured log events shipped to the logging backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warn", alias = "WARNING")]
    Warn,
    #[serde(alias = "error")]
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Name understood by the logging backend's `severity` field.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Severity::Warn => "WARNING",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured log line.
///
/// Built by value and never mutated once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    severity: Severity,
    message: String,
    metadata: Map<String, Value>,
}

impl LogEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            metadata: Map::new(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Attach one metadata entry. A repeated key replaces the earlier value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach every entry of `metadata`.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Mirror the event to the local `tracing` subscriber.
    pub fn emit(&self) {
        let metadata = Value::Object(self.metadata.clone());
        match self.severity {
            Severity::Debug => tracing::debug!(metadata = %metadata, "{}", self.message),
            Severity::Info => tracing::info!(metadata = %metadata, "{}", self.message),
            Severity::Warn => tracing::warn!(metadata = %metadata, "{}", self.message),
            Severity::Error => tracing::error!(metadata = %metadata, "{}", self.message),
        }
    }
}

/// Ordered events recorded while handling one request.
#[derive(Debug, Default)]
pub struct RequestLog {
    request_id: String,
    events: Vec<LogEvent>,
}

impl RequestLog {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            events: Vec::new(),
        }
    }

    /// Tag `event` with the request id, mirror it locally and keep it.
    pub fn record(&mut self, event: LogEvent) {
        let event = event.with("request_id", self.request_id.clone());
        event.emit();
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }
}
