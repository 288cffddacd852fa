//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel address used as sender for mints and recipient for burns.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Monitored network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Gnosis chain (formerly xDai).
    Xdai,
    /// Ethereum mainnet.
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Xdai, Network::Mainnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Xdai => "xdai",
            Network::Mainnet => "mainnet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic action of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Mint,
    Burn,
    Transfer,
}

impl Action {
    /// Classify by exact, case-sensitive comparison against [`ZERO_ADDRESS`].
    pub fn classify(from_address: &str, to_address: &str) -> Self {
        if from_address == ZERO_ADDRESS {
            Action::Mint
        } else if to_address == ZERO_ADDRESS {
            Action::Burn
        } else {
            Action::Transfer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Mint => "mint",
            Action::Burn => "burn",
            Action::Transfer => "transfer",
        }
    }
}

/// A decoded `Transfer` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Token identifier in decimal form.
    pub token_id: String,
    /// Transaction hash that emitted the event.
    pub tx_hash: String,
    /// Sender, checksummed.
    pub from_address: String,
    /// Recipient, checksummed.
    pub to_address: String,
    /// Network the event was observed on.
    pub network: Network,
}

impl TransferEvent {
    pub fn action(&self) -> Action {
        Action::classify(&self.from_address, &self.to_address)
    }
}

/// Lifecycle phase of a network subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    Connecting,
    Subscribed,
    Reconnecting,
    Failed,
    Stopped,
}

impl ConnectionPhase {
    /// Numeric value exported as a gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            ConnectionPhase::Connecting => 0.0,
            ConnectionPhase::Subscribed => 1.0,
            ConnectionPhase::Reconnecting => 2.0,
            ConnectionPhase::Failed => 3.0,
            ConnectionPhase::Stopped => 4.0,
        }
    }

    /// Whether the subscription will never deliver again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionPhase::Failed | ConnectionPhase::Stopped)
    }
}

/// Observable state of one network subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionState {
    pub network: Network,
    pub phase: ConnectionPhase,
    /// Hash of the most recently accepted transfer.
    pub last_seen_tx_hash: Option<String>,
}

impl SubscriptionState {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            phase: ConnectionPhase::Connecting,
            last_seen_tx_hash: None,
        }
    }
}

/// Errors that can occur while talking to a node.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Connecting to the node failed.
    #[error("Connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    /// The subscription request or stream failed.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// A configured value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The subscription gave up after exhausting reconnect attempts.
    #[error("Subscription on {network} failed after {attempts} reconnect attempts")]
    ReconnectExhausted { network: Network, attempts: u32 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// A notification that does not have the shape of a `Transfer` log.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log is not a Transfer event: {0}")]
    NotTransfer(String),

    #[error("log has no transaction hash")]
    MissingTxHash,
}
