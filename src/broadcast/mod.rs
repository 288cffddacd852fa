//! Broadcast subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkSubscriber (xdai) ─┐
//!                           ├─→ hub.rs (serialize once) ─→ ClientSink per connection
//! NetworkSubscriber (main) ─┘
//! ```
//!
//! # Design Decisions
//! - Registry is a concurrent map; both networks broadcast without coordination
//! - Sends are non-blocking and isolated per connection
//! - Membership is driven by the connection layer (http::websocket)

pub mod connection;
pub mod hub;

pub use connection::{ClientSink, ConnectionId, SinkError};
pub use hub::{BroadcastHub, BroadcastReport};
