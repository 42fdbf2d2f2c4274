//! Response handling and transformation.
//!
//! # Responsibilities
//! - Fixed bodies for the terminal outcomes (401, 404, 500)
//! - Buffer an upstream response and hand it back to the client
//! - Rewrite the CDN settings so analytics traffic returns through the proxy
//!
//! # Design Decisions
//! - Hop-by-hop headers stripped from every upstream response
//! - API responses pass through byte-for-byte
//! - A settings body without the expected field fails the request; nothing partial is sent

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::http::error::UpstreamBodyError;
use crate::routing::matcher::parent_domain;
use crate::security::headers::{allow_any_origin, strip_hop_by_hop};

const API_HOST_POINTER: &str = "/integrations/Segment.io/apiHost";

pub fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "SCRAM!").into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "subdomain not found").into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

/// A fully read upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamReply {
    /// Drain `response`, dropping hop-by-hop headers.
    pub async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Rewrite the settings body and mark it readable from any origin.
    ///
    /// Validators describing the upstream body are dropped with it.
    pub fn into_settings(self, public_host: &str, secret: &str) -> Result<Self, UpstreamBodyError> {
        let body = rewrite_settings(&self.body, public_host, secret)?;
        let mut headers = self.headers;
        headers.remove(header::ETAG);
        headers.remove(header::LAST_MODIFIED);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        allow_any_origin(&mut headers);
        Ok(Self {
            status: self.status,
            headers,
            body: Bytes::from(body),
        })
    }
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Authority the rewritten `apiHost` points at.
///
/// An explicit override wins; otherwise the API subdomain under the inbound
/// host's parent domain.
pub fn public_api_host(explicit: Option<&str>, api_subdomain: &str, inbound_host: Option<&str>) -> String {
    if let Some(host) = explicit {
        return host.to_string();
    }
    match inbound_host.and_then(parent_domain) {
        Some(parent) => format!("{api_subdomain}.{parent}"),
        None => api_subdomain.to_string(),
    }
}

/// `api.segment.io/v1` becomes `<public_host>/<secret>/v1`.
pub fn rewrite_api_host(original: &str, public_host: &str, secret: &str) -> String {
    match original.split_once('/') {
        Some((_, rest)) if !rest.is_empty() => format!("{public_host}/{secret}/{rest}"),
        _ => format!("{public_host}/{secret}"),
    }
}

/// Point `integrations["Segment.io"].apiHost` back through the proxy.
pub fn rewrite_settings(body: &[u8], public_host: &str, secret: &str) -> Result<Vec<u8>, UpstreamBodyError> {
    let mut settings: Value = serde_json::from_slice(body).map_err(UpstreamBodyError::NotJson)?;

    let api_host = settings
        .pointer_mut(API_HOST_POINTER)
        .ok_or(UpstreamBodyError::MissingApiHost)?;
    let original = api_host.as_str().ok_or(UpstreamBodyError::MissingApiHost)?;
    let rewritten = rewrite_api_host(original, public_host, secret);
    *api_host = Value::String(rewritten);

    serde_json::to_vec(&settings).map_err(UpstreamBodyError::Serialize)
}
