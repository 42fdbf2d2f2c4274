//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (steps >= 1, addresses parse)
//! - Detect conflicting subdomain labels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, RetryConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routing.secret_prefix must not be empty")]
    EmptySecretPrefix,

    #[error("routing.secret_prefix must be a single path segment")]
    SecretPrefixNotSegment,

    #[error("{field} must be a single non-empty DNS label, got {value:?}")]
    InvalidSubdomain { field: &'static str, value: String },

    #[error("routing.cdn_subdomain and routing.api_subdomain must differ")]
    DuplicateSubdomain,

    #[error("{field} must be an absolute http(s) URL, got {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be at least 1")]
    ZeroRetrySteps { field: &'static str },

    #[error("{field} is not a socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("export.log_id must be non-empty and contain no '/', got {0:?}")]
    InvalidLogId(String),
}

/// Check every semantic rule, collecting all violations.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let routing = &config.routing;
    if routing.secret_prefix.is_empty() {
        errors.push(ValidationError::EmptySecretPrefix);
    } else if routing.secret_prefix.contains('/') {
        errors.push(ValidationError::SecretPrefixNotSegment);
    }

    check_label("routing.cdn_subdomain", &routing.cdn_subdomain, &mut errors);
    check_label("routing.api_subdomain", &routing.api_subdomain, &mut errors);
    if !routing.cdn_subdomain.is_empty()
        && routing.cdn_subdomain.eq_ignore_ascii_case(&routing.api_subdomain)
    {
        errors.push(ValidationError::DuplicateSubdomain);
    }

    check_url("routing.cdn_origin", &routing.cdn_origin, &mut errors);
    check_url("routing.api_origin", &routing.api_origin, &mut errors);

    check_steps("retries.steps", &config.retries, &mut errors);

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    let export = &config.export;
    if export.enabled {
        check_url("export.endpoint", &export.endpoint, &mut errors);
        check_steps("export.retries.steps", &export.retries, &mut errors);
        if export.log_id.is_empty() || export.log_id.contains('/') {
            errors.push(ValidationError::InvalidLogId(export.log_id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_label(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() || value.contains('.') || value.contains('/') {
        errors.push(ValidationError::InvalidSubdomain {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_steps(field: &'static str, retries: &RetryConfig, errors: &mut Vec<ValidationError>) {
    if retries.steps == 0 {
        errors.push(ValidationError::ZeroRetrySteps { field });
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
