//! Retry logic.
//!
//! # Responsibilities
//! - Determine if an outbound request is retryable
//! - Decide how long to wait before the next attempt
//!
//! # Design Decisions
//! - Failures without a response (connect, timeout, body) are always retryable
//! - Any status >= 400 is retryable by default, 4xx included
//! - Client-error retries can be switched off; other statuses >= 400 stay retryable

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::ApiRetryConfig;
use crate::resilience::backoff::linear_backoff;

/// Retry policy for outbound REST calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Linear backoff step in milliseconds.
    pub base_delay_ms: u64,
    /// Retry 4xx responses.
    pub retry_client_errors: bool,
}

impl RetryPolicy {
    /// Create from config.
    pub fn new(config: &ApiRetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            retry_client_errors: config.retry_client_errors,
        }
    }

    /// Whether a failed attempt should be retried.
    ///
    /// `status` is `None` when no response was received.
    pub fn is_retryable(&self, status: Option<StatusCode>) -> bool {
        match status {
            None => true,
            Some(status) if status.is_client_error() => self.retry_client_errors,
            Some(status) => status.as_u16() >= 400,
        }
    }

    /// Whether another attempt is allowed after `attempt` failed.
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before `attempt` (1-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        linear_backoff(attempt, self.base_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&ApiRetryConfig::default())
    }
}
