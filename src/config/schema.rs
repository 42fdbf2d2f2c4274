//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::ServiceAccountKey;
use crate::observability::event::Severity;

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Secret gate and subdomain dispatch.
    pub routing: RoutingConfig,

    /// Backoff policy for upstream calls.
    pub retries: RetryConfig,

    /// Log export to the logging backend.
    pub export: ExportConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Service-account credential. Only ever supplied through the environment.
    #[serde(skip)]
    pub service_account: Option<ServiceAccountKey>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// First path segment every request must carry. Never logged.
    pub secret_prefix: String,

    /// Leading host label dispatched to the CDN upstream.
    pub cdn_subdomain: String,

    /// Leading host label dispatched to the API upstream.
    pub api_subdomain: String,

    /// Scheme and authority of the CDN upstream.
    pub cdn_origin: String,

    /// Scheme and authority of the API upstream.
    pub api_origin: String,

    /// Authority written into the rewritten `apiHost`.
    /// Derived from the inbound host when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_api_host: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            secret_prefix: String::new(),
            cdn_subdomain: "cdn".to_string(),
            api_subdomain: "segapi".to_string(),
            cdn_origin: "https://cdn.segment.com".to_string(),
            api_origin: "https://api.segment.io".to_string(),
            public_api_host: None,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts (at least 1).
    pub steps: u32,

    /// Linear backoff unit in milliseconds.
    pub step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            step_ms: 50,
        }
    }
}

/// Log export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Ship log events to the logging backend.
    pub enabled: bool,

    /// Write endpoint of the logging backend.
    pub endpoint: String,

    /// Audience claim of the minted assertions.
    pub audience: String,

    /// Log stream identifier inside the service account's project.
    pub log_id: String,

    /// Labels attached to every write request.
    pub labels: BTreeMap<String, String>,

    /// Events below this severity are dropped before buffering.
    pub min_severity: Severity,

    /// Backoff policy for export calls.
    pub retries: RetryConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("service".to_string(), "edge-proxy".to_string());
        Self {
            enabled: true,
            endpoint: "https://logging.googleapis.com/v2/entries:write".to_string(),
            audience: crate::auth::token::DEFAULT_AUDIENCE.to_string(),
            log_id: "edge-proxy".to_string(),
            labels,
            min_severity: Severity::Debug,
            retries: RetryConfig::default(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long shutdown waits for detached work (log shipping) in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { drain_secs: 30 }
    }
}

/// Local log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Local log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
