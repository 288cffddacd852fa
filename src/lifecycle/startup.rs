//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the enrichment client and broadcast hub
//! - Spawn one subscriber per monitored network
//! - Bind the listener and serve the feed
//! - Coordinate shutdown on signal or fatal subscription failure
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subscribers start before the listener accepts clients
//! - Shutdown has timeout: drain is abandoned after a deadline

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::api::{ApiError, Enricher, FetchClient};
use crate::blockchain::{
    AlloyLogSource, BlockchainError, LogSource, Network, NetworkSubscriber, SubscriberHandle,
};
use crate::broadcast::BroadcastHub;
use crate::config::FeedConfig;
use crate::http::FeedServer;
use crate::lifecycle::Shutdown;

/// Time allowed for tasks to finish after shutdown is triggered.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that stop the feed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error("Feed server failed: {0}")]
    Server(std::io::Error),
}

/// A started feed: subscribers running, listener bound, not yet serving.
pub struct Feed {
    hub: BroadcastHub,
    handles: Vec<SubscriberHandle>,
    listener: TcpListener,
    shutdown: Shutdown,
    fatal_on_exhaustion: bool,
}

impl Feed {
    /// Connect to every configured network node and bind the listener.
    pub async fn start(config: &FeedConfig, shutdown: Shutdown) -> Result<Self, StartupError> {
        let mut sources: Vec<(Network, Arc<dyn LogSource>)> = Vec::with_capacity(Network::ALL.len());
        for network in Network::ALL {
            let source = AlloyLogSource::new(config.nodes.endpoint(network), &config.contract.address)?;
            sources.push((network, Arc::new(source)));
        }
        Self::with_sources(config, sources, shutdown).await
    }

    /// Start with explicit log sources, one subscriber each.
    pub async fn with_sources(
        config: &FeedConfig,
        sources: Vec<(Network, Arc<dyn LogSource>)>,
        shutdown: Shutdown,
    ) -> Result<Self, StartupError> {
        let client = FetchClient::new(&config.api)?;
        let enricher = Arc::new(Enricher::new(client, &config.enrichment));
        let hub = BroadcastHub::new();

        let handles = sources
            .into_iter()
            .map(|(network, source)| {
                NetworkSubscriber::new(
                    network,
                    source,
                    enricher.clone(),
                    hub.clone(),
                    config.reconnect.clone(),
                    config.enrichment.max_in_flight,
                )
                .spawn(shutdown.subscribe())
            })
            .collect();

        let address = config.listener.bind_address.clone();
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(source) => {
                // Subscribers are already running; stop them before bailing out.
                shutdown.trigger();
                return Err(StartupError::Bind { address, source });
            }
        };

        Ok(Self {
            hub,
            handles,
            listener,
            shutdown,
            fatal_on_exhaustion: config.reconnect.fatal_on_exhaustion,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Serve until `stop` resolves, the server fails, or a subscription
    /// gives up while `fatal_on_exhaustion` is set.
    pub async fn run<F>(self, stop: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        let Feed {
            hub,
            handles,
            listener,
            shutdown,
            fatal_on_exhaustion,
        } = self;

        let watches = handles.iter().map(|h| h.watch()).collect();
        let server = FeedServer::new(hub, watches, shutdown.clone());
        let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));
        let mut server_finished = false;

        let mut subscribers = JoinSet::new();
        for handle in handles {
            subscribers.spawn(async move {
                let network = handle.network();
                (network, handle.join().await)
            });
        }

        tokio::pin!(stop);
        let outcome = loop {
            tokio::select! {
                _ = &mut stop => break Ok(()),
                result = &mut server_task => {
                    server_finished = true;
                    break match result {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(StartupError::Server(e)),
                        Err(e) => Err(StartupError::Server(std::io::Error::other(e))),
                    };
                }
                Some(joined) = subscribers.join_next() => match joined {
                    Ok((network, Ok(()))) => {
                        tracing::debug!(network = %network, "Subscriber finished");
                    }
                    Ok((network, Err(e))) => {
                        if fatal_on_exhaustion {
                            tracing::error!(network = %network, error = %e, "Stopping feed");
                            break Err(e.into());
                        }
                        tracing::warn!(network = %network, error = %e, "Continuing without network");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Subscriber task panicked");
                    }
                },
            }
        };

        tracing::info!("Shutting down");
        shutdown.trigger();

        let drain = async {
            if !server_finished {
                match (&mut server_task).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!(error = %e, "Feed server failed during shutdown"),
                    Err(e) => tracing::error!(error = %e, "Feed server task panicked"),
                }
            }
            while let Some(joined) = subscribers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Subscriber task panicked");
                }
            }
        };

        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            tracing::warn!(timeout = ?DRAIN_TIMEOUT, "Shutdown drain timed out");
        }

        outcome
    }
}
