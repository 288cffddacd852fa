//! Metrics collection and exposition.
//!
//! # Metrics
//! - `feed_transfers_total` (counter): decoded transfers by network
//! - `feed_duplicates_total` (counter): suppressed adjacent duplicates
//! - `feed_decode_failures_total` (counter): malformed notifications
//! - `feed_enrichments_total` (counter): enrichment outcomes by network
//! - `feed_fetch_retries_total` (counter): REST retries by endpoint
//! - `feed_broadcast_deliveries_total` (counter): per-connection send outcomes
//! - `feed_reconnects_total` (counter): reconnect attempts by network
//! - `feed_connected_clients` (gauge): registered client connections
//! - `feed_subscription_phase` (gauge): numeric phase by network
//!
//! Recording is a no-op until a recorder is installed by `init_metrics`.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::blockchain::types::{ConnectionPhase, Network};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transfer(network: Network) {
    ::metrics::counter!("feed_transfers_total", "network" => network.as_str()).increment(1);
}

pub fn record_duplicate(network: Network) {
    ::metrics::counter!("feed_duplicates_total", "network" => network.as_str()).increment(1);
}

pub fn record_decode_failure(network: Network) {
    ::metrics::counter!("feed_decode_failures_total", "network" => network.as_str()).increment(1);
}

pub fn record_enrichment(network: Network, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!(
        "feed_enrichments_total",
        "network" => network.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fetch_retry(endpoint: &'static str) {
    ::metrics::counter!("feed_fetch_retries_total", "endpoint" => endpoint).increment(1);
}

pub fn record_broadcast(delivered: usize, failed: usize) {
    ::metrics::counter!("feed_broadcast_deliveries_total", "outcome" => "delivered")
        .increment(delivered as u64);
    ::metrics::counter!("feed_broadcast_deliveries_total", "outcome" => "failed")
        .increment(failed as u64);
}

pub fn record_reconnect(network: Network) {
    ::metrics::counter!("feed_reconnects_total", "network" => network.as_str()).increment(1);
}

pub fn record_client_count(count: usize) {
    ::metrics::gauge!("feed_connected_clients").set(count as f64);
}

pub fn record_phase(network: Network, phase: ConnectionPhase) {
    ::metrics::gauge!("feed_subscription_phase", "network" => network.as_str())
        .set(phase.as_gauge());
}
