//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the feed, status and health handlers
//! - Wire up tracing middleware
//! - Bind server to listener
//! - Stop accepting and close feed connections on shutdown

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::trace::TraceLayer;

use crate::blockchain::types::SubscriptionState;
use crate::broadcast::BroadcastHub;
use crate::http::{status, websocket};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: BroadcastHub,
    pub subscriptions: Arc<Vec<watch::Receiver<SubscriptionState>>>,
    pub shutdown: Shutdown,
}

/// WebSocket server for the transfer feed.
pub struct FeedServer {
    router: Router,
}

impl FeedServer {
    /// Create a server broadcasting from `hub`.
    ///
    /// `subscriptions` back the `/status` endpoint; `shutdown` closes open
    /// feed connections when triggered.
    pub fn new(
        hub: BroadcastHub,
        subscriptions: Vec<watch::Receiver<SubscriptionState>>,
        shutdown: Shutdown,
    ) -> Self {
        let state = AppState {
            hub,
            subscriptions: Arc::new(subscriptions),
            shutdown,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(websocket::ws_handler))
            .route("/status", get(status::get_status))
            .route("/health", get(status::get_health))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Feed server listening");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Feed server stopped");
        Ok(())
    }
}
