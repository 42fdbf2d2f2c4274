//! Request-path error types.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::resilience::FetchError;

/// The CDN settings body could not be rewritten.
#[derive(Debug, Error)]
pub enum UpstreamBodyError {
    #[error("settings body is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("settings body has no string at integrations[\"Segment.io\"].apiHost")]
    MissingApiHost,

    #[error("failed to serialize rewritten settings: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Any failure while serving a routed request. Always answered with a 500.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] FetchError<reqwest::Error>),

    #[error("failed to read upstream body: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("failed to read request body: {0}")]
    InboundBody(#[source] axum::Error),

    #[error(transparent)]
    UpstreamBody(#[from] UpstreamBodyError),
}

impl ProxyError {
    /// Stable identifier for logs and alerts.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(_) => "upstream_unreachable",
            ProxyError::ReadBody(_) => "upstream_read",
            ProxyError::InboundBody(_) => "inbound_body",
            ProxyError::UpstreamBody(UpstreamBodyError::NotJson(_)) => "settings_not_json",
            ProxyError::UpstreamBody(UpstreamBodyError::MissingApiHost) => "settings_missing_api_host",
            ProxyError::UpstreamBody(UpstreamBodyError::Serialize(_)) => "settings_serialize",
        }
    }

    /// The error flattened into log metadata: message, kind and source chain.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            causes.push(Value::String(cause.to_string()));
            source = cause.source();
        }

        let mut metadata = Map::new();
        metadata.insert("error".into(), Value::String(self.to_string()));
        metadata.insert("error_kind".into(), Value::String(self.kind().into()));
        metadata.insert("causes".into(), Value::Array(causes));
        metadata
    }
}
