//! HTTP and WebSocket surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing layer)
//!     → websocket.rs (upgrade on "/", register with the hub)
//!     → status.rs ("/status" and "/health")
//! ```

pub mod server;
pub mod status;
pub mod websocket;

pub use server::{AppState, FeedServer};
