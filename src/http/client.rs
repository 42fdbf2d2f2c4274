//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Issue the upstream leg for a routed request
//! - Wrap every call in the linear backoff loop
//!
//! # Design Decisions
//! - Bodies are buffered as `Bytes` so each retry replays the same payload
//! - The CDN leg is a bodiless GET regardless of the inbound method

use axum::{
    body::Bytes,
    http::{HeaderMap, Method},
};

use crate::resilience::{retryable_fetch, BackoffPolicy, FetchError};
use crate::routing::{RouteKind, UpstreamTarget};

/// Request to send upstream, built once and replayed per attempt.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub target: UpstreamTarget,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    /// Shape the request for `target.kind`.
    pub fn new(method: Method, target: UpstreamTarget, headers: HeaderMap, body: Bytes) -> Self {
        match target.kind {
            RouteKind::Cdn => Self {
                method: Method::GET,
                target,
                headers,
                body: Bytes::new(),
            },
            RouteKind::Api => Self {
                method,
                target,
                headers,
                body,
            },
        }
    }
}

/// Shared client for both upstream legs.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    policy: BackoffPolicy,
}

impl UpstreamClient {
    pub fn new(client: reqwest::Client, policy: BackoffPolicy) -> Self {
        Self { client, policy }
    }

    /// Send `request`, retrying 5xx and transport failures.
    pub async fn send(&self, request: &UpstreamRequest) -> Result<reqwest::Response, FetchError<reqwest::Error>> {
        let url = request.target.url.as_str();
        retryable_fetch(url, &self.policy, || {
            let mut builder = self
                .client
                .request(request.method.clone(), request.target.url.clone())
                .headers(request.headers.clone());
            if !request.body.is_empty() {
                builder = builder.body(request.body.clone());
            }
            builder.send()
        })
        .await
    }
}
