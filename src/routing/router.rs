//! Route decision and upstream target resolution.
//!
//! # Responsibilities
//! - Decide `Cdn | Api | NotFound | Unauthorized` from host and path
//! - Resolve the upstream URL for the two served routes
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - The gate runs before dispatch: an unauthorized request never reveals routing
//! - Deterministic: same host and path always yield the same decision

use url::Url;

use crate::config::RoutingConfig;
use crate::routing::matcher::{leading_label, SecretPrefix};

/// Which upstream, if any, serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Cdn,
    Api,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Cdn => "cdn",
            RouteKind::Api => "api",
        }
    }
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve from an upstream; `path` has the secret segment removed.
    Forward { kind: RouteKind, path: String },
    NotFound,
    Unauthorized,
}

impl RouteDecision {
    /// Low-cardinality label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RouteDecision::Forward { kind, .. } => kind.as_str(),
            RouteDecision::NotFound => "not_found",
            RouteDecision::Unauthorized => "unauthorized",
        }
    }
}

/// Resolved upstream location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub kind: RouteKind,
    pub url: Url,
}

/// Compiled routing table.
#[derive(Debug, Clone)]
pub struct Router {
    secret: SecretPrefix,
    cdn_subdomain: String,
    api_subdomain: String,
    cdn_origin: Url,
    api_origin: Url,
}

impl Router {
    /// Compile the routing table. Fails only on origins that are not URLs.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            secret: SecretPrefix::new(config.secret_prefix.clone()),
            cdn_subdomain: config.cdn_subdomain.to_ascii_lowercase(),
            api_subdomain: config.api_subdomain.to_ascii_lowercase(),
            cdn_origin: Url::parse(&config.cdn_origin)?,
            api_origin: Url::parse(&config.api_origin)?,
        })
    }

    pub fn secret(&self) -> &SecretPrefix {
        &self.secret
    }

    pub fn api_subdomain(&self) -> &str {
        &self.api_subdomain
    }

    /// Route a request by lowercased `host` and raw `path`.
    pub fn decide(&self, host: Option<&str>, path: &str) -> RouteDecision {
        let Some(rest) = self.secret.strip(path) else {
            return RouteDecision::Unauthorized;
        };

        let label = host.map(leading_label).unwrap_or_default();
        let kind = if label == self.cdn_subdomain {
            RouteKind::Cdn
        } else if label == self.api_subdomain {
            RouteKind::Api
        } else {
            return RouteDecision::NotFound;
        };

        RouteDecision::Forward {
            kind,
            path: rest.to_string(),
        }
    }

    /// Upstream URL for `kind`, carrying `path` and the original `query`.
    pub fn target(&self, kind: RouteKind, path: &str, query: Option<&str>) -> UpstreamTarget {
        let mut url = match kind {
            RouteKind::Cdn => self.cdn_origin.clone(),
            RouteKind::Api => self.api_origin.clone(),
        };
        url.set_path(path);
        url.set_query(query);
        UpstreamTarget { kind, url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        let config = RoutingConfig {
            secret_prefix: "sek".into(),
            ..RoutingConfig::default()
        };
        Router::from_config(&config).unwrap()
    }

    #[test]
    fn test_cdn_dispatch() {
        let decision = router().decide(Some("cdn.example.com"), "/sek/v1/projects/abc/settings");
        assert_eq!(
            decision,
            RouteDecision::Forward {
                kind: RouteKind::Cdn,
                path: "/v1/projects/abc/settings".into()
            }
        );
        assert_eq!(decision.label(), "cdn");
    }

    #[test]
    fn test_api_dispatch() {
        let decision = router().decide(Some("segapi.example.com"), "/sek/v1/t");
        assert_eq!(
            decision,
            RouteDecision::Forward {
                kind: RouteKind::Api,
                path: "/v1/t".into()
            }
        );
    }

    #[test]
    fn test_gate_before_dispatch() {
        assert_eq!(router().decide(Some("cdn.example.com"), "/v1/t"), RouteDecision::Unauthorized);
        assert_eq!(router().decide(Some("other.example.com"), "/nope"), RouteDecision::Unauthorized);
        assert_eq!(router().decide(None, "/"), RouteDecision::Unauthorized);
    }

    #[test]
    fn test_unknown_subdomain() {
        assert_eq!(router().decide(Some("www.example.com"), "/sek/x"), RouteDecision::NotFound);
        assert_eq!(router().decide(None, "/sek/x"), RouteDecision::NotFound);
        // The label must match exactly, not by prefix.
        assert_eq!(router().decide(Some("cdn2.example.com"), "/sek/x"), RouteDecision::NotFound);
    }

    #[test]
    fn test_target_urls() {
        let router = router();
        let cdn = router.target(RouteKind::Cdn, "/v1/projects/abc/settings", None);
        assert_eq!(cdn.url.as_str(), "https://cdn.segment.com/v1/projects/abc/settings");

        let api = router.target(RouteKind::Api, "/v1/batch", Some("a=1&b=2"));
        assert_eq!(api.url.as_str(), "https://api.segment.io/v1/batch?a=1&b=2");
    }

    #[test]
    fn test_origin_with_port() {
        let config = RoutingConfig {
            secret_prefix: "sek".into(),
            cdn_origin: "http://127.0.0.1:9000".into(),
            ..RoutingConfig::default()
        };
        let router = Router::from_config(&config).unwrap();
        let target = router.target(RouteKind::Cdn, "/settings.json", None);
        assert_eq!(target.url.as_str(), "http://127.0.0.1:9000/settings.json");
    }
}
