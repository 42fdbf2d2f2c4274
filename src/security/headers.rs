//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Build the header set forwarded upstream
//! - Add the permissive CORS header to rewritten settings
//!
//! # Design Decisions
//! - `Host` is never forwarded; the client sets it from the upstream URL
//! - Headers named by `Connection` are hop-by-hop too
//! - A leg whose body gets rewritten asks for the full, identity-encoded body

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers that describe one connection and must not cross the proxy.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Request headers that let the upstream answer with a partial or empty body.
const CONDITIONAL: [HeaderName; 6] = [
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
    header::IF_MATCH,
    header::IF_UNMODIFIED_SINCE,
    header::IF_RANGE,
    header::RANGE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Inbound headers to send upstream.
///
/// With `rewrites_body` set, `Accept-Encoding` and the conditional and range
/// headers are dropped too, so the upstream always answers with the whole
/// identity-encoded body the proxy is about to rewrite.
pub fn forwarded_request_headers(inbound: &HeaderMap, rewrites_body: bool) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    if rewrites_body {
        headers.remove(header::ACCEPT_ENCODING);
        for name in &CONDITIONAL {
            headers.remove(name);
        }
    }
    headers
}

/// Allow any origin to read the response.
pub fn allow_any_origin(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}
