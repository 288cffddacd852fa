//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build client + hub → Spawn subscribers → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Subscribers stop → Server stops accepting → Feed connections close
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then subscribers, then listener
//! - Shutdown has timeout: drain abandoned after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Feed, StartupError};
