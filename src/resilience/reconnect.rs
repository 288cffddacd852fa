//! Node reconnection policy.
//!
//! # State Transitions
//! ```text
//! Subscribed → Reconnecting: stream ended or connect failed
//! Reconnecting → Subscribed: subscribe succeeded (attempt counter reset)
//! Reconnecting → Failed: max_attempts exhausted and on_timeout disabled
//! Reconnecting → Reconnecting: max_attempts exhausted and on_timeout enabled (new round)
//! ```

use std::time::Duration;

use crate::config::ReconnectConfig;

/// What to do after a connection was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait `delay`, then make attempt number `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// Stop reconnecting.
    GiveUp,
}

/// Tracks consecutive reconnect attempts for one subscription.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        Self { config, attempts: 0 }
    }

    /// Decide the next step after a drop or failed attempt.
    pub fn next(&mut self) -> ReconnectDecision {
        if !self.config.auto {
            return ReconnectDecision::GiveUp;
        }

        if self.attempts >= self.config.max_attempts {
            if !self.config.on_timeout {
                return ReconnectDecision::GiveUp;
            }
            tracing::warn!(
                max_attempts = self.config.max_attempts,
                "Reconnect attempts exhausted, starting a new round"
            );
            self.attempts = 0;
        }

        self.attempts += 1;
        ReconnectDecision::Retry {
            attempt: self.attempts,
            delay: Duration::from_millis(self.config.delay_ms),
        }
    }

    /// Forget past failures after a successful subscribe.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts made in the current round.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether giving up should take the process down.
    pub fn is_fatal(&self) -> bool {
        self.config.fatal_on_exhaustion
    }
}
