//! Client connection handles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Failure to hand a message to one client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("connection closed")]
    Closed,

    #[error("send buffer full")]
    Full,

    #[error("send failed: {0}")]
    Other(String),
}

/// Outgoing side of a client connection.
///
/// `send` must not block: the hub calls it for every client in turn.
pub trait ClientSink: Send + Sync {
    fn send(&self, payload: Arc<str>) -> Result<(), SinkError>;
}

impl ClientSink for mpsc::Sender<Arc<str>> {
    fn send(&self, payload: Arc<str>) -> Result<(), SinkError> {
        self.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

impl ClientSink for mpsc::UnboundedSender<Arc<str>> {
    fn send(&self, payload: Arc<str>) -> Result<(), SinkError> {
        mpsc::UnboundedSender::send(self, payload).map_err(|_| SinkError::Closed)
    }
}
