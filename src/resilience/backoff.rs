//! Backoff delay calculation.

use std::time::Duration;

/// Linear backoff: the delay before attempt `n` is `n * step_ms`.
///
/// Attempt 1 is the initial request and never waits.
pub fn linear_backoff(attempt: u32, step_ms: u64) -> Duration {
    if attempt <= 1 {
        return Duration::from_millis(0);
    }

    Duration::from_millis(step_ms.saturating_mul(attempt as u64))
}
