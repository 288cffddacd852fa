use axum::{extract::State, Json};
use serde::Serialize;

use crate::blockchain::types::{ConnectionPhase, SubscriptionState};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct FeedStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub clients: usize,
    pub networks: Vec<SubscriptionState>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<FeedStatus> {
    let networks: Vec<SubscriptionState> = state
        .subscriptions
        .iter()
        .map(|rx| rx.borrow().clone())
        .collect();

    let status = if networks.iter().all(|n| n.phase == ConnectionPhase::Subscribed) {
        "operational"
    } else {
        "degraded"
    };

    Json(FeedStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        clients: state.hub.connection_count(),
        networks,
    })
}

pub async fn get_health() -> &'static str {
    "ok"
}
