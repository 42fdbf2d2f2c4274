//! Retry logic.
//!
//! # Responsibilities
//! - Issue an outbound call up to `policy.steps()` times
//! - Sleep with linear backoff between attempts
//! - Classify outcomes: `< 500` returns immediately, `>= 500` and transport
//!   failures are retried
//!
//! # Design Decisions
//! - An exhausted run of 5xx responses returns the last response, not an error
//! - Only a transport failure on the final attempt becomes `RetryableFetchTimeout`
//! - The call is a closure so the same loop wraps proxy and export traffic

use std::future::Future;

use axum::http::StatusCode;
use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::backoff::BackoffPolicy;

/// Failure of a call wrapped in [`retryable_fetch`].
#[derive(Debug, Error)]
pub enum FetchError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt ended in a transport failure; carries the last one.
    #[error("retryable fetch timed out after {attempts} attempts")]
    RetryableFetchTimeout {
        attempts: u32,
        #[source]
        source: E,
    },
}

/// Anything with an HTTP status the retry loop can classify.
pub trait UpstreamStatus {
    fn status(&self) -> StatusCode;
}

impl UpstreamStatus for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }
}

impl<B> UpstreamStatus for axum::http::Response<B> {
    fn status(&self) -> StatusCode {
        axum::http::Response::status(self)
    }
}

/// Run `call` under `policy`.
///
/// `target` only labels diagnostics.
pub async fn retryable_fetch<F, Fut, R, E>(
    target: &str,
    policy: &BackoffPolicy,
    mut call: F,
) -> Result<R, FetchError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    R: UpstreamStatus,
    E: std::error::Error + 'static,
{
    let steps = policy.steps();
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            tracing::info!(target_url = %target, attempt, delay = ?delay, "Retrying request");
            metrics::record_retry();
            tokio::time::sleep(delay).await;
        }

        let last = attempt + 1 >= steps;
        match call().await {
            Ok(response) if response.status().as_u16() < 500 => return Ok(response),
            Ok(response) if last => {
                tracing::warn!(
                    target_url = %target,
                    status = %response.status(),
                    attempts = steps,
                    "Retries exhausted, returning last upstream response"
                );
                return Ok(response);
            }
            Ok(response) => {
                tracing::warn!(target_url = %target, attempt, status = %response.status(), "Upstream server error");
            }
            Err(source) if last => {
                tracing::error!(target_url = %target, attempts = steps, error = %source, "Retries exhausted");
                return Err(FetchError::RetryableFetchTimeout {
                    attempts: steps,
                    source,
                });
            }
            Err(error) => {
                tracing::warn!(target_url = %target, attempt, error = %error, "Upstream transport error");
            }
        }

        attempt += 1;
    }
}
