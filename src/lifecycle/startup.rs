//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the shared upstream client
//! - Choose the log destination from config and credential
//! - Assemble the log buffer handed to the HTTP server
//!
//! # Design Decisions
//! - A missing credential downgrades export to the local sink instead of failing startup
//! - Key material is not parsed here; a bad key surfaces at export time only

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::observability::{CloudLoggingExporter, LocalSink, LogBuffer, LogSink};
use crate::resilience::InvalidPolicy;

/// Shared outbound client. Redirects are returned to the caller, never followed.
pub fn upstream_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Pick where drained log batches go.
pub fn log_sink(config: &ProxyConfig, client: reqwest::Client) -> Result<Arc<dyn LogSink>, InvalidPolicy> {
    if !config.export.enabled {
        tracing::info!("Log export disabled, draining to local sink");
        return Ok(Arc::new(LocalSink));
    }

    match &config.service_account {
        Some(credential) => {
            let exporter = CloudLoggingExporter::new(client, credential.clone(), &config.export)?;
            tracing::info!(
                endpoint = %config.export.endpoint,
                log_name = %exporter.log_name(),
                client_email = %credential.client_email,
                "Log export enabled"
            );
            Ok(Arc::new(exporter))
        }
        None => {
            tracing::warn!("No service account configured, draining logs to local sink");
            Ok(Arc::new(LocalSink))
        }
    }
}

/// Build the shared log buffer for `config`.
pub fn log_buffer(config: &ProxyConfig, client: reqwest::Client) -> Result<Arc<LogBuffer>, InvalidPolicy> {
    let sink = log_sink(config, client)?;
    Ok(Arc::new(LogBuffer::new(sink, config.export.min_severity)))
}
