//! POAP transfer feed library.
//!
//! Watches `Transfer` events of the POAP contract on xDai and mainnet,
//! enriches each with token metadata, holder power and ENS name, and
//! broadcasts the result to every connected WebSocket client.

pub mod api;
pub mod blockchain;
pub mod broadcast;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::FeedConfig;
pub use http::FeedServer;
pub use lifecycle::{Feed, Shutdown};
