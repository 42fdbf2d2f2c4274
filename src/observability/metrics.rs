//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route, status
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_upstream_retries_total` (counter): backoff retries across all outbound calls
//! - `proxy_log_export_total` (counter): export batches by outcome
//! - `proxy_log_events_exported_total` (counter): events in successful batches
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests need no setup
//! - Labels stay low-cardinality (never paths or hosts)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!("proxy_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record one backoff retry.
pub fn record_retry() {
    metrics::counter!("proxy_upstream_retries_total").increment(1);
}

/// Record the outcome of one export batch.
pub fn record_export(outcome: &'static str, events: usize) {
    metrics::counter!("proxy_log_export_total", "outcome" => outcome).increment(1);
    if outcome == "ok" {
        metrics::counter!("proxy_log_events_exported_total").increment(events as u64);
    }
}
