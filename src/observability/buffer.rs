//! Shared log buffer and its drain destinations.
//!
//! # Responsibilities
//! - Accept whole per-request batches from concurrent handlers
//! - Drop events below the configured severity
//! - Hand snapshots of the pending queue to a [`LogSink`]
//!
//! # Design Decisions
//! - `append` is synchronous and never awaits; the lock is held only to move events
//! - A request's events are appended together, so they stay contiguous and ordered
//! - `flush` drains everything pending; concurrent flushes see disjoint snapshots

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::observability::event::{LogEvent, Severity};

/// Destination invoked with drained batches.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Ship one batch. Failures are handled (logged) by the sink itself.
    async fn export(&self, batch: Vec<LogEvent>);
}

/// Sink used when no logging backend is configured: batches go to `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSink;

#[async_trait]
impl LogSink for LocalSink {
    async fn export(&self, batch: Vec<LogEvent>) {
        let lines: Vec<String> = batch
            .iter()
            .map(|e| format!("{} {}", e.severity(), e.message()))
            .collect();
        tracing::debug!(count = batch.len(), lines = ?lines, "Log batch drained locally");
    }
}

/// Append-only queue shared by every in-flight request.
pub struct LogBuffer {
    pending: Mutex<Vec<LogEvent>>,
    sink: Arc<dyn LogSink>,
    min_severity: Severity,
}

impl LogBuffer {
    pub fn new(sink: Arc<dyn LogSink>, min_severity: Severity) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            sink,
            min_severity,
        }
    }

    /// Queue a request's events, preserving their order.
    pub fn append(&self, events: Vec<LogEvent>) {
        let min = self.min_severity;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.extend(events.into_iter().filter(|e| e.severity() >= min));
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything currently pending.
    pub fn snapshot(&self) -> Vec<LogEvent> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drain the current snapshot into the sink. Returns the number of events shipped.
    pub async fn flush(&self) -> usize {
        let batch = self.snapshot();
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();
        self.sink.export(batch).await;
        count
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBuffer")
            .field("pending", &self.len())
            .field("min_severity", &self.min_severity)
            .finish()
    }
}
