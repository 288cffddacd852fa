//! Per-network subscription pipeline.
//!
//! # Tasks
//! ```text
//! connection task                          worker task
//! ───────────────                          ───────────
//! LogSource::subscribe()                   decode → dedupe
//!   → stream items ──── mpsc (ordered) ──→   → enrich (concurrent, FuturesOrdered)
//!   → on end: reconnect policy               → broadcast in arrival order
//! ```
//!
//! # Design Decisions
//! - One subscriber per network; nothing but the hub is shared
//! - Decode and dedupe run strictly in arrival order
//! - Enrichments overlap, broadcasts commit in arrival order
//! - Enrichment failures never affect the subscription or dedupe state

use std::sync::Arc;

use alloy::rpc::types::Log;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesOrdered;
use futures_util::StreamExt;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::api::{EnrichedRecord, Enricher};
use crate::blockchain::client::{LogSource, LogStream};
use crate::blockchain::decode::decode_transfer;
use crate::blockchain::dedupe::Deduplicator;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConnectionPhase, Network, SubscriptionState, TransferEvent,
};
use crate::broadcast::BroadcastHub;
use crate::config::ReconnectConfig;
use crate::observability::metrics;
use crate::resilience::{ReconnectDecision, ReconnectPolicy};

/// Notifications buffered between the connection and the worker.
const LOG_QUEUE_CAPACITY: usize = 1024;

type PendingEnrichment = BoxFuture<'static, (TransferEvent, Option<EnrichedRecord>)>;

/// Owns the event pipeline of one network.
pub struct NetworkSubscriber {
    network: Network,
    source: Arc<dyn LogSource>,
    enricher: Arc<Enricher>,
    hub: BroadcastHub,
    reconnect: ReconnectConfig,
    max_in_flight: usize,
}

impl NetworkSubscriber {
    pub fn new(
        network: Network,
        source: Arc<dyn LogSource>,
        enricher: Arc<Enricher>,
        hub: BroadcastHub,
        reconnect: ReconnectConfig,
        max_in_flight: usize,
    ) -> Self {
        Self {
            network,
            source,
            enricher,
            hub,
            reconnect,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Start the connection and worker tasks.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> SubscriberHandle {
        let (state_tx, state_rx) = watch::channel(SubscriptionState::new(self.network));
        let state_tx = Arc::new(state_tx);
        let (log_tx, log_rx) = mpsc::channel(LOG_QUEUE_CAPACITY);

        let worker = Worker {
            network: self.network,
            enricher: self.enricher,
            hub: self.hub,
            dedupe: Deduplicator::new(),
            max_in_flight: self.max_in_flight,
            state: state_tx.clone(),
        };
        let worker_task = tokio::spawn(worker.run(log_rx));

        let connection = Connection {
            network: self.network,
            source: self.source,
            policy: ReconnectPolicy::new(self.reconnect),
            log_tx,
            state: state_tx,
        };

        let network = self.network;
        let task = tokio::spawn(async move {
            let result = connection.run(shutdown).await;
            // The log sender is gone; the worker drains what it has and exits.
            if let Err(e) = worker_task.await {
                tracing::error!(network = %network, error = %e, "Worker task panicked");
            }
            result
        });

        SubscriberHandle {
            network: self.network,
            state: state_rx,
            task,
        }
    }
}

/// Handle to a running subscriber.
pub struct SubscriberHandle {
    network: Network,
    state: watch::Receiver<SubscriptionState>,
    task: JoinHandle<BlockchainResult<()>>,
}

impl SubscriberHandle {
    pub fn network(&self) -> Network {
        self.network
    }

    /// Current state snapshot.
    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes state changes.
    pub fn watch(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }

    /// Wait for both tasks to finish.
    ///
    /// Returns `ReconnectExhausted` when the subscription gave up.
    pub async fn join(self) -> BlockchainResult<()> {
        self.task
            .await
            .map_err(|e| BlockchainError::Subscription(format!("subscriber task failed: {}", e)))?
    }
}

/// Connection side: subscribe, forward notifications, reconnect.
struct Connection {
    network: Network,
    source: Arc<dyn LogSource>,
    policy: ReconnectPolicy,
    log_tx: mpsc::Sender<Log>,
    state: Arc<watch::Sender<SubscriptionState>>,
}

enum StreamEnd {
    Dropped,
    Shutdown,
}

impl Connection {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> BlockchainResult<()> {
        tracing::info!(
            network = %self.network,
            endpoint = %self.source.endpoint(),
            "Subscribing to {}",
            self.network
        );
        self.set_phase(ConnectionPhase::Connecting);

        loop {
            let subscribed = tokio::select! {
                result = self.source.subscribe() => result,
                _ = shutdown.recv() => return self.stop(),
            };

            match subscribed {
                Ok(mut stream) => {
                    self.policy.reset();
                    self.set_phase(ConnectionPhase::Subscribed);
                    tracing::info!(network = %self.network, "Connected to {}", self.network);

                    match self.forward(&mut stream, &mut shutdown).await {
                        StreamEnd::Shutdown => return self.stop(),
                        StreamEnd::Dropped => {
                            tracing::warn!(network = %self.network, "Subscription stream ended");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        network = %self.network,
                        attempt = self.policy.attempts(),
                        error = %e,
                        "Error on {}",
                        self.network
                    );
                }
            }

            match self.policy.next() {
                ReconnectDecision::Retry { attempt, delay } => {
                    self.set_phase(ConnectionPhase::Reconnecting);
                    metrics::record_reconnect(self.network);
                    tracing::info!(
                        network = %self.network,
                        attempt = attempt,
                        delay = ?delay,
                        "Reconnecting"
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = shutdown.recv() => return self.stop(),
                    }
                }
                ReconnectDecision::GiveUp => {
                    self.set_phase(ConnectionPhase::Failed);
                    let err = BlockchainError::ReconnectExhausted {
                        network: self.network,
                        attempts: self.policy.attempts(),
                    };
                    if self.policy.is_fatal() {
                        tracing::error!(network = %self.network, error = %err, "Subscription failed");
                    } else {
                        tracing::warn!(network = %self.network, error = %err, "Subscription gave up");
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn forward(
        &self,
        stream: &mut LogStream,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> StreamEnd {
        loop {
            tokio::select! {
                item = stream.next() => match item {
                    Some(Ok(log)) => {
                        if self.log_tx.send(log).await.is_err() {
                            return StreamEnd::Shutdown;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(network = %self.network, error = %e, "Error on {}", self.network);
                    }
                    None => return StreamEnd::Dropped,
                },
                _ = shutdown.recv() => return StreamEnd::Shutdown,
            }
        }
    }

    fn stop(&self) -> BlockchainResult<()> {
        self.set_phase(ConnectionPhase::Stopped);
        tracing::info!(network = %self.network, "Subscription stopped");
        Ok(())
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        self.state.send_modify(|state| state.phase = phase);
        metrics::record_phase(self.network, phase);
    }
}

/// Worker side: decode, dedupe, enrich, broadcast.
struct Worker {
    network: Network,
    enricher: Arc<Enricher>,
    hub: BroadcastHub,
    dedupe: Deduplicator,
    max_in_flight: usize,
    state: Arc<watch::Sender<SubscriptionState>>,
}

impl Worker {
    async fn run(mut self, mut log_rx: mpsc::Receiver<Log>) {
        let mut pending: FuturesOrdered<PendingEnrichment> = FuturesOrdered::new();

        loop {
            tokio::select! {
                received = log_rx.recv(), if pending.len() < self.max_in_flight => match received {
                    Some(log) => self.accept(log, &mut pending),
                    None => break,
                },
                Some((event, record)) = pending.next(), if !pending.is_empty() => {
                    self.commit(&event, record);
                }
            }
        }

        while let Some((event, record)) = pending.next().await {
            self.commit(&event, record);
        }
        tracing::debug!(network = %self.network, "Worker drained");
    }

    fn accept(&mut self, log: Log, pending: &mut FuturesOrdered<PendingEnrichment>) {
        if log.removed {
            tracing::info!(
                network = %self.network,
                tx_hash = ?log.transaction_hash,
                "Changed on {}: log removed by reorg",
                self.network
            );
            return;
        }

        let event = match decode_transfer(&log, self.network) {
            Ok(event) => event,
            Err(e) => {
                metrics::record_decode_failure(self.network);
                tracing::warn!(network = %self.network, error = %e, "Dropping malformed notification");
                return;
            }
        };

        tracing::info!(
            "Transfer on {} - Token #{} - Hash: {}",
            event.network,
            event.token_id,
            event.tx_hash
        );
        metrics::record_transfer(self.network);

        if !self.dedupe.observe(&event.tx_hash) {
            metrics::record_duplicate(self.network);
            return;
        }
        let last_seen = event.tx_hash.clone();
        self.state
            .send_modify(|state| state.last_seen_tx_hash = Some(last_seen));

        let enricher = self.enricher.clone();
        pending.push_back(Box::pin(async move {
            let record = enricher.enrich(&event).await;
            (event, record)
        }));
    }

    fn commit(&self, event: &TransferEvent, record: Option<EnrichedRecord>) {
        metrics::record_enrichment(self.network, record.is_some());
        let Some(record) = record else {
            return;
        };

        match self.hub.broadcast(&record) {
            Ok(report) => tracing::info!(
                network = %event.network,
                token_id = %event.token_id,
                action = record.action.as_str(),
                delivered = report.delivered,
                failed = report.failed,
                "Transfer broadcast"
            ),
            Err(e) => tracing::error!(
                network = %event.network,
                token_id = %event.token_id,
                error = %e,
                "Failed to serialize record"
            ),
        }
    }
}
