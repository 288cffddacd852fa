//! Transfer enrichment.
//!
//! After a settling delay (the API indexes new tokens with some lag), three
//! independent lookups run concurrently:
//!
//! ```text
//!                ┌─ /token/{id}                → metadata
//! TransferEvent ─┼─ /actions/scan/{to}         → holdings → poapPower, powerEmoji
//!                └─ /actions/ens_lookup/{to}   → ens
//! ```
//!
//! Any lookup failing after its retries fails the whole enrichment.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::sleep;

use crate::api::client::FetchClient;
use crate::api::types::{ApiError, ApiResult, EnrichedRecord, EnsLookup};
use crate::blockchain::types::TransferEvent;
use crate::config::EnrichmentConfig;

/// Builds [`EnrichedRecord`]s from transfer events.
#[derive(Debug, Clone)]
pub struct Enricher {
    client: FetchClient,
    settle_delay: Duration,
}

impl Enricher {
    pub fn new(client: FetchClient, config: &EnrichmentConfig) -> Self {
        Self {
            client,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }

    /// Enrich an event, logging and swallowing failures.
    ///
    /// `None` means the event must be dropped.
    pub async fn enrich(&self, event: &TransferEvent) -> Option<EnrichedRecord> {
        match self.try_enrich(event).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(
                    network = %event.network,
                    token_id = %event.token_id,
                    tx_hash = %event.tx_hash,
                    error = %e,
                    "Error getting token info"
                );
                None
            }
        }
    }

    /// Enrich an event, returning the first failure.
    pub async fn try_enrich(&self, event: &TransferEvent) -> ApiResult<EnrichedRecord> {
        if !self.settle_delay.is_zero() {
            sleep(self.settle_delay).await;
        }

        let (metadata, holdings, ens) = tokio::try_join!(
            self.token_metadata(&event.token_id),
            self.holdings(&event.to_address),
            self.ens_lookup(&event.to_address),
        )?;

        tracing::debug!(
            network = %event.network,
            token_id = %event.token_id,
            poap_power = holdings.len(),
            "Transfer enriched"
        );

        Ok(EnrichedRecord::new(
            metadata,
            holdings.len() as u64,
            ens.name(),
            event.action(),
        ))
    }

    async fn token_metadata(&self, token_id: &str) -> ApiResult<Map<String, Value>> {
        let path = format!("/token/{}", token_id);
        match self.client.get_json(&path, "token").await? {
            Value::Object(map) => Ok(map),
            other => Err(ApiError::Decode {
                url: format!("{}{}", self.client.base_url(), path),
                message: format!("expected an object, got {}", json_kind(&other)),
            }),
        }
    }

    async fn holdings(&self, address: &str) -> ApiResult<Vec<Value>> {
        self.client
            .get(&format!("/actions/scan/{}", address), "scan")
            .await
    }

    async fn ens_lookup(&self, address: &str) -> ApiResult<EnsLookup> {
        self.client
            .get(&format!("/actions/ens_lookup/{}", address), "ens_lookup")
            .await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
