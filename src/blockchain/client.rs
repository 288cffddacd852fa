//! Node connection and log subscription.
//!
//! # Responsibilities
//! - Connect to a WebSocket JSON-RPC endpoint
//! - Subscribe to `Transfer` logs of the watched contract
//! - Surface transport errors as stream items, connection loss as stream end
//!
//! Reconnection is not handled here: the subscriber calls `subscribe()` again
//! when the returned stream completes.

use std::pin::Pin;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::Log;
use futures_util::future::BoxFuture;
use futures_util::{Stream, StreamExt};
use tokio::time::timeout;

use crate::blockchain::decode::transfer_filter;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Upper bound for establishing a connection and subscription.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stream of raw subscription notifications.
pub type LogStream = Pin<Box<dyn Stream<Item = BlockchainResult<Log>> + Send>>;

/// Abstracts over the node transport so subscribers can be driven by tests.
pub trait LogSource: Send + Sync {
    /// Endpoint description used in logs.
    fn endpoint(&self) -> &str;

    /// Connect and start streaming `Transfer` logs.
    fn subscribe(&self) -> BoxFuture<'_, BlockchainResult<LogStream>>;
}

/// [`LogSource`] backed by an alloy WebSocket provider.
pub struct AlloyLogSource {
    ws_url: String,
    contract: Address,
}

impl AlloyLogSource {
    pub fn new(ws_url: impl Into<String>, contract: &str) -> BlockchainResult<Self> {
        let contract: Address = contract
            .parse()
            .map_err(|e| BlockchainError::InvalidConfig(format!("contract address '{}': {}", contract, e)))?;

        Ok(Self {
            ws_url: ws_url.into(),
            contract,
        })
    }

    async fn connect(&self) -> BlockchainResult<LogStream> {
        let connection_error = |reason: String| BlockchainError::Connection {
            url: self.ws_url.clone(),
            reason,
        };

        let provider = timeout(
            CONNECT_TIMEOUT,
            ProviderBuilder::new().connect_ws(WsConnect::new(self.ws_url.clone())),
        )
        .await
        .map_err(|_| connection_error(format!("timed out after {:?}", CONNECT_TIMEOUT)))?
        .map_err(|e| connection_error(e.to_string()))?;

        let subscription = timeout(CONNECT_TIMEOUT, provider.subscribe_logs(&transfer_filter(self.contract)))
            .await
            .map_err(|_| BlockchainError::Subscription("eth_subscribe timed out".to_string()))?
            .map_err(|e| BlockchainError::Subscription(e.to_string()))?;

        tracing::info!(
            endpoint = %self.ws_url,
            contract = %self.contract,
            subscription_id = %subscription.local_id(),
            "Subscribed to Transfer logs"
        );

        // The provider owns the socket; keep it alive for as long as the stream.
        let stream = subscription.into_result_stream().map(move |item| {
            let _ = &provider;
            item.map_err(|e| BlockchainError::Subscription(e.to_string()))
        });

        Ok(Box::pin(stream))
    }
}

impl LogSource for AlloyLogSource {
    fn endpoint(&self) -> &str {
        &self.ws_url
    }

    fn subscribe(&self) -> BoxFuture<'_, BlockchainResult<LogStream>> {
        Box::pin(self.connect())
    }
}

impl std::fmt::Debug for AlloyLogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyLogSource")
            .field("ws_url", &self.ws_url)
            .field("contract", &self.contract)
            .finish()
    }
}
