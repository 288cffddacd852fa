//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides, after .env)
//!     → validation.rs (semantic checks)
//!     → FeedConfig (validated, immutable)
//!     → cloned into each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::FeedConfig;
pub use schema::{
    ApiConfig, ApiRetryConfig, ContractConfig, EnrichmentConfig, ListenerConfig, LogFormat,
    NodeConfig, ObservabilityConfig, ReconnectConfig,
};
