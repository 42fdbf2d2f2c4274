//! Linear backoff policy.
//!
//! Attempt `i` (zero-based) waits `i * step` before it is issued, so the
//! first attempt is immediate and the total minimum delay for `n` attempts
//! is `step * (0 + 1 + ... + (n - 1))`.

use std::time::Duration;
use thiserror::Error;

use crate::config::RetryConfig;

/// Rejected backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backoff policy requires at least one step")]
pub struct InvalidPolicy;

/// Bounded retry schedule shared by every outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    steps: u32,
    step: Duration,
}

impl BackoffPolicy {
    /// Create a policy. `steps` is the total number of attempts and must be at least 1.
    pub fn new(steps: u32, step: Duration) -> Result<Self, InvalidPolicy> {
        if steps == 0 {
            return Err(InvalidPolicy);
        }
        Ok(Self { steps, step })
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Delay to wait before attempt number `attempt` (zero-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        linear_backoff(attempt, self.step)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            steps: 10,
            step: Duration::from_millis(50),
        }
    }
}

impl TryFrom<&RetryConfig> for BackoffPolicy {
    type Error = InvalidPolicy;

    fn try_from(config: &RetryConfig) -> Result<Self, Self::Error> {
        Self::new(config.steps, Duration::from_millis(config.step_ms))
    }
}

/// Calculate the delay for a zero-based attempt number.
pub fn linear_backoff(attempt: u32, step: Duration) -> Duration {
    step.saturating_mul(attempt)
}
