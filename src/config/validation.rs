//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required values are present (node endpoints, contract, API)
//! - Validate value formats (addresses, URLs) and ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FeedConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;

use crate::blockchain::types::Network;
use crate::config::schema::FeedConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a loaded configuration.
pub fn validate_config(config: &FeedConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for network in Network::ALL {
        let field = format!("nodes.{}_ws_url", network);
        let endpoint = config.nodes.endpoint(network);
        if endpoint.is_empty() {
            errors.push(ValidationError::new(field, "missing websocket provider"));
        } else if let Err(e) = url::Url::parse(endpoint) {
            errors.push(ValidationError::new(field, format!("invalid URL: {}", e)));
        }
    }

    if config.contract.address.is_empty() {
        errors.push(ValidationError::new("contract.address", "missing contract address"));
    } else if config.contract.address.parse::<Address>().is_err() {
        errors.push(ValidationError::new("contract.address", "not a valid address"));
    }

    if config.api.base_url.is_empty() {
        errors.push(ValidationError::new("api.base_url", "missing API base URL"));
    } else if let Err(e) = url::Url::parse(&config.api.base_url) {
        errors.push(ValidationError::new("api.base_url", format!("invalid URL: {}", e)));
    }

    if config.api.api_key.is_empty() {
        errors.push(ValidationError::new("api.api_key", "missing API key"));
    }

    if config.api.retry.max_attempts == 0 {
        errors.push(ValidationError::new("api.retry.max_attempts", "must be at least 1"));
    }

    if config.enrichment.max_in_flight == 0 {
        errors.push(ValidationError::new("enrichment.max_in_flight", "must be at least 1"));
    }

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
