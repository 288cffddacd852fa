//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the feed.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::Network;

/// Root configuration for the transfer feed.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FeedConfig {
    /// Listener configuration for the WebSocket server.
    pub listener: ListenerConfig,

    /// Node endpoints, one per monitored network.
    pub nodes: NodeConfig,

    /// Contract being watched.
    pub contract: ContractConfig,

    /// REST API used for enrichment.
    pub api: ApiConfig,

    /// Enrichment pipeline tuning.
    pub enrichment: EnrichmentConfig,

    /// Node reconnection policy.
    pub reconnect: ReconnectConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the host part.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.bind_address = format!("{}:{}", host, port);
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// WebSocket node endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NodeConfig {
    /// xDai (Gnosis) WebSocket RPC URL.
    pub xdai_ws_url: String,

    /// Ethereum mainnet WebSocket RPC URL.
    pub mainnet_ws_url: String,
}

impl NodeConfig {
    /// Endpoint configured for a network.
    pub fn endpoint(&self, network: Network) -> &str {
        match network {
            Network::Xdai => &self.xdai_ws_url,
            Network::Mainnet => &self.mainnet_ws_url,
        }
    }
}

/// Watched contract.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Contract address emitting `Transfer` events (same on both networks).
    pub address: String,
}

/// REST API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. "https://api.poap.tech".
    pub base_url: String,

    /// Value sent in the `x-api-key` header.
    pub api_key: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Retry policy for outbound requests.
    pub retry: ApiRetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            request_timeout_secs: 30,
            retry: ApiRetryConfig::default(),
        }
    }
}

/// Retry configuration for outbound REST calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiRetryConfig {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,

    /// Linear backoff step: attempt `n` waits `n * base_delay_ms`.
    pub base_delay_ms: u64,

    /// Retry 4xx responses as well as 5xx.
    pub retry_client_errors: bool,
}

impl Default for ApiRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 4000,
            retry_client_errors: true,
        }
    }
}

/// Enrichment pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Delay before querying the API, covering its indexing lag.
    pub settle_delay_ms: u64,

    /// Maximum enrichments in flight per network.
    pub max_in_flight: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 5000,
            max_in_flight: 32,
        }
    }
}

/// Node reconnection policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Reconnect automatically after a drop.
    pub auto: bool,

    /// Fixed delay before each reconnect attempt in milliseconds.
    pub delay_ms: u64,

    /// Attempts per round before giving up.
    pub max_attempts: u32,

    /// Start a new round of attempts instead of failing once a round is exhausted.
    pub on_timeout: bool,

    /// Terminate the process when a network fails permanently.
    pub fatal_on_exhaustion: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto: true,
            delay_ms: 5000,
            max_attempts: 20,
            on_timeout: false,
            fatal_on_exhaustion: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
