//! Request matching primitives.
//!
//! # Responsibilities
//! - Extract the request hostname (URI authority, else `Host` header)
//! - Match the leading DNS label against configured subdomains
//! - Check and strip the secret first path segment
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive and segment-aware: `/sek` never matches `/sekret`
//! - Plain string slicing, no regex, no allocation on the match path

use axum::http::{header, Request};

/// Lowercased hostname of `req`, without port.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    let raw = req.uri().host().or_else(|| {
        req.headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
    })?;
    let host = strip_port(raw);
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

fn strip_port(authority: &str) -> &str {
    // Bracketed IPv6 literals keep their colons.
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    authority.split(':').next().unwrap_or(authority)
}

/// Everything before the first `.` of `host`.
pub fn leading_label(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

/// Everything after the first `.` of `host`, if any.
pub fn parent_domain(host: &str) -> Option<&str> {
    host.split_once('.').map(|(_, parent)| parent).filter(|p| !p.is_empty())
}

/// The secret first path segment.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretPrefix {
    segment: String,
}

impl SecretPrefix {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.segment
    }

    /// Remove the secret segment from `path`, returning the remainder.
    ///
    /// The remainder always starts with `/`. Returns `None` if `path` does not
    /// start with the secret segment.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.segment.is_empty() {
            return None;
        }
        let rest = path.strip_prefix('/')?.strip_prefix(self.segment.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// `path` with its first segment masked.
///
/// A rejected path may carry the secret or a near miss of it, so only this
/// form is ever logged.
pub fn redact_first_segment(path: &str) -> String {
    let rest = path.strip_prefix('/').unwrap_or(path);
    match rest.split_once('/') {
        Some((_, tail)) => format!("/<redacted>/{tail}"),
        None if rest.is_empty() => "/".to_string(),
        None => "/<redacted>".to_string(),
    }
}

// Never print the secret.
impl std::fmt::Debug for SecretPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretPrefix(<redacted>)")
    }
}
