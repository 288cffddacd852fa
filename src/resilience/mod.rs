//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound REST request:
//!     → request timeout (reqwest client)
//!     → On failure: retries.rs (check if retryable, wait linear backoff)
//!
//! Node subscription:
//!     → On drop: reconnect.rs (fixed delay, bounded attempts)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline or a bounded retry budget
//! - Backoff delays are derived from the attempt index only
//! - Policies are plain values, owned by the caller that uses them

pub mod backoff;
pub mod reconnect;
pub mod retries;

pub use reconnect::{ReconnectDecision, ReconnectPolicy};
pub use retries::RetryPolicy;
