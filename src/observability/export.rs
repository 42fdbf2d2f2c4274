//! Log export to the centralized logging backend.
//!
//! # Responsibilities
//! - Mint a fresh bearer assertion per batch, off the async workers
//! - Encode a batch as an `entries:write` request
//! - POST it through the backoff layer
//!
//! # Design Decisions
//! - Export runs after the response is committed; failures are logged, never raised
//! - No retry here beyond what the backoff layer does
//! - Metadata is flattened into `jsonPayload`; the event message wins a key clash

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::{BearerAssertion, InvalidCredential, ServiceAccountKey, TokenMinter};
use crate::config::ExportConfig;
use crate::observability::buffer::LogSink;
use crate::observability::event::LogEvent;
use crate::observability::metrics;
use crate::resilience::{retryable_fetch, BackoffPolicy, FetchError, InvalidPolicy};

/// Failure to ship one batch.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Credential(#[from] InvalidCredential),

    #[error("token minting task failed: {0}")]
    Mint(#[from] tokio::task::JoinError),

    #[error("log export transport failed: {0}")]
    Fetch(#[from] FetchError<reqwest::Error>),

    #[error("logging backend rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Body of an `entries:write` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteEntriesRequest {
    pub log_name: String,
    pub resource: MonitoredResource,
    pub labels: BTreeMap<String, String>,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub severity: &'static str,
    pub json_payload: Map<String, Value>,
}

impl From<&LogEvent> for LogEntry {
    fn from(event: &LogEvent) -> Self {
        let mut payload = event.metadata().clone();
        payload.insert("message".to_string(), Value::String(event.message().to_string()));
        Self {
            severity: event.severity().backend_name(),
            json_payload: payload,
        }
    }
}

/// [`LogSink`] writing to the logging backend as a service account.
pub struct CloudLoggingExporter {
    client: reqwest::Client,
    credential: ServiceAccountKey,
    minter: TokenMinter,
    endpoint: String,
    log_id: String,
    labels: BTreeMap<String, String>,
    policy: BackoffPolicy,
}

impl CloudLoggingExporter {
    pub fn new(
        client: reqwest::Client,
        credential: ServiceAccountKey,
        config: &ExportConfig,
    ) -> Result<Self, InvalidPolicy> {
        Ok(Self {
            client,
            credential,
            minter: TokenMinter::new(config.audience.clone()),
            endpoint: config.endpoint.clone(),
            log_id: config.log_id.clone(),
            labels: config.labels.clone(),
            policy: BackoffPolicy::try_from(&config.retries)?,
        })
    }

    /// Full log name inside the service account's project.
    pub fn log_name(&self) -> String {
        format!("projects/{}/logs/{}", self.credential.project_id, self.log_id)
    }

    pub fn build_request(&self, batch: &[LogEvent]) -> WriteEntriesRequest {
        let mut resource_labels = BTreeMap::new();
        resource_labels.insert("project_id".to_string(), self.credential.project_id.clone());

        WriteEntriesRequest {
            log_name: self.log_name(),
            resource: MonitoredResource {
                kind: "global".to_string(),
                labels: resource_labels,
            },
            labels: self.labels.clone(),
            entries: batch.iter().map(LogEntry::from).collect(),
        }
    }

    /// Sign a fresh assertion on the blocking pool; RSA signing is CPU bound.
    pub async fn mint(&self) -> Result<BearerAssertion, ExportError> {
        let minter = self.minter.clone();
        let credential = self.credential.clone();
        let assertion = tokio::task::spawn_blocking(move || minter.mint(&credential)).await??;
        Ok(assertion)
    }

    /// Ship `batch`, reporting the first failure.
    pub async fn try_export(&self, batch: &[LogEvent]) -> Result<(), ExportError> {
        let assertion = self.mint().await?;
        let authorization = assertion.authorization();
        let body = self.build_request(batch);

        let response = retryable_fetch(&self.endpoint, &self.policy, || {
            self.client
                .post(&self.endpoint)
                .header(AUTHORIZATION, &authorization)
                .json(&body)
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for CloudLoggingExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudLoggingExporter")
            .field("endpoint", &self.endpoint)
            .field("log_name", &self.log_name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LogSink for CloudLoggingExporter {
    async fn export(&self, batch: Vec<LogEvent>) {
        match self.try_export(&batch).await {
            Ok(()) => {
                tracing::debug!(count = batch.len(), "Log batch exported");
                metrics::record_export("ok", batch.len());
            }
            Err(e) => {
                tracing::error!(error = %e, count = batch.len(), "Log export failed, batch dropped");
                metrics::record_export("failed", batch.len());
            }
        }
    }
}
