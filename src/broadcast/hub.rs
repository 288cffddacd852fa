//! Fan-out of records to connected clients.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::broadcast::connection::{ClientSink, ConnectionId};
use crate::observability::metrics;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections that accepted the message.
    pub delivered: usize,
    /// Connections whose send failed.
    pub failed: usize,
}

/// Registry of live client connections.
///
/// The connection layer registers and unregisters clients; the hub only
/// tracks membership. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    connections: Arc<DashMap<ConnectionId, Arc<dyn ClientSink>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection and return its handle.
    pub fn register(&self, sink: Arc<dyn ClientSink>) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(id, sink);
        let count = self.connections.len();
        metrics::record_client_count(count);
        tracing::debug!(connection = %id, clients = count, "Client registered");
        id
    }

    /// Remove a connection. Returns false if it was not registered.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.remove(&id).is_some();
        let count = self.connections.len();
        metrics::record_client_count(count);
        if removed {
            tracing::debug!(connection = %id, clients = count, "Client unregistered");
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Serialize `record` once and send it to every connection.
    pub fn broadcast<T: Serialize>(&self, record: &T) -> Result<BroadcastReport, serde_json::Error> {
        let payload: Arc<str> = serde_json::to_string(record)?.into();
        Ok(self.broadcast_text(payload))
    }

    /// Send a pre-serialized payload to every connection.
    ///
    /// Each send is isolated: a failing connection is logged and skipped.
    pub fn broadcast_text(&self, payload: Arc<str>) -> BroadcastReport {
        // Snapshot so sinks run without holding registry locks.
        let targets: Vec<(ConnectionId, Arc<dyn ClientSink>)> = self
            .connections
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (id, sink) in targets {
            match sink.send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(connection = %id, error = %e, "Error sending WebSocket message");
                }
            }
        }

        metrics::record_broadcast(report.delivered, report.failed);
        report
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("connections", &self.connections.len())
            .finish()
    }
}
