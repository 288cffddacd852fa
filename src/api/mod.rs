//! Enrichment API subsystem.
//!
//! # Data Flow
//! ```text
//! TransferEvent
//!     → enricher.rs (settling delay, three concurrent lookups, classification)
//!     → client.rs (x-api-key header, linear-backoff retries)
//!     → EnrichedRecord (types.rs)
//! ```

pub mod client;
pub mod enricher;
pub mod types;

pub use client::FetchClient;
pub use enricher::Enricher;
pub use types::{ApiError, ApiResult, EnrichedRecord, EnsLookup, PowerTier};
