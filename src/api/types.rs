//! Enrichment types and error definitions.

use reqwest::StatusCode;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::blockchain::types::Action;

/// Errors raised by outbound API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connect, timeout, body read).
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with an error status.
    #[error("Request to {url} returned {status}")]
    Status { url: String, status: StatusCode },

    /// The body was not the expected JSON.
    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The retry budget ran out; wraps the last failure.
    #[error("Giving up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<ApiError> },

    /// The HTTP client could not be built.
    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl ApiError {
    /// HTTP status of the underlying failure, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Response of `/actions/ens_lookup/{address}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnsLookup {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub ens: Option<String>,
}

impl EnsLookup {
    /// The name, only when the lookup reports it as valid.
    pub fn name(self) -> Option<String> {
        if self.valid {
            self.ens
        } else {
            None
        }
    }
}

/// Holder power tier, derived from the number of tokens held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTier {
    /// 0 to 5 tokens.
    Newcomer,
    /// 6 to 10 tokens.
    Green,
    /// 11 to 20 tokens.
    Yellow,
    /// 21 to 50 tokens.
    Red,
    /// More than 50 tokens.
    Fire,
}

impl PowerTier {
    pub fn from_power(power: u64) -> Self {
        match power {
            0..=5 => PowerTier::Newcomer,
            6..=10 => PowerTier::Green,
            11..=20 => PowerTier::Yellow,
            21..=50 => PowerTier::Red,
            _ => PowerTier::Fire,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PowerTier::Newcomer => "🆕",
            PowerTier::Green => "🟢",
            PowerTier::Yellow => "🟡",
            PowerTier::Red => "🔴",
            PowerTier::Fire => "🔥",
        }
    }
}

impl Serialize for PowerTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.emoji())
    }
}

/// Wire names of the derived fields; they shadow metadata keys of the same name.
const DERIVED_FIELDS: [&str; 4] = ["poapPower", "powerEmoji", "action", "ens"];

/// A transfer enriched with API data, ready for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// Token metadata as returned by the API.
    pub metadata: Map<String, Value>,
    /// Number of tokens held by the recipient.
    pub poap_power: u64,
    pub power_emoji: PowerTier,
    pub action: Action,
    /// Reverse-resolved name of the recipient.
    pub ens: Option<String>,
}

impl EnrichedRecord {
    pub fn new(metadata: Map<String, Value>, poap_power: u64, ens: Option<String>, action: Action) -> Self {
        Self {
            metadata,
            poap_power,
            power_emoji: PowerTier::from_power(poap_power),
            action,
            ens,
        }
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.metadata {
            if !DERIVED_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry("poapPower", &self.poap_power)?;
        map.serialize_entry("powerEmoji", &self.power_emoji)?;
        map.serialize_entry("action", &self.action)?;
        if let Some(ens) = &self.ens {
            map.serialize_entry("ens", ens)?;
        }
        map.end()
    }
}
