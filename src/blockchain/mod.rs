//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! WebSocket node endpoint (per network)
//!     → client.rs (connect, eth_subscribe logs for the contract)
//!     → subscriber.rs (reconnect state machine, ordered worker)
//!     → decode.rs (Transfer log → TransferEvent)
//!     → dedupe.rs (suppress adjacent repeats)
//!     → api::Enricher → broadcast::BroadcastHub
//! ```

pub mod client;
pub mod decode;
pub mod dedupe;
pub mod subscriber;
pub mod types;

pub use client::{AlloyLogSource, LogSource, LogStream};
pub use subscriber::{NetworkSubscriber, SubscriberHandle};
pub use types::{
    Action, BlockchainError, BlockchainResult, ConnectionPhase, DecodeError, Network, SubscriptionState, TransferEvent,
    ZERO_ADDRESS,
};
