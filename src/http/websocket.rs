//! WebSocket feed connections.
//!
//! # Responsibilities
//! - Complete the upgrade handshake with any client (no authentication)
//! - Register the connection with the broadcast hub for its lifetime
//! - Forward hub messages as text frames
//!
//! # Design Decisions
//! - Clients only receive; incoming data frames are ignored
//! - Each connection has a bounded buffer so a slow client cannot stall broadcasts
//! - Ping/pong handled by the WebSocket layer while reading

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::http::server::AppState;

/// Messages buffered per client before sends start failing.
pub const CLIENT_BUFFER: usize = 256;

/// Upgrade handler for the feed endpoint.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<Arc<str>>(CLIENT_BUFFER);
    let id = state.hub.register(Arc::new(tx));
    let mut shutdown = state.shutdown.subscribe();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(connection = %id, peer = %peer, "Client connected");

    loop {
        tokio::select! {
            outgoing = rx.recv() => match outgoing {
                Some(payload) => {
                    if let Err(e) = sender.send(Message::Text(payload.to_string().into())).await {
                        tracing::warn!(connection = %id, error = %e, "Failed to write to client");
                        break;
                    }
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(connection = %id, error = %e, "Client connection error");
                    break;
                }
            },
            _ = shutdown.recv() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.hub.unregister(id);
    tracing::info!(connection = %id, peer = %peer, "Client disconnected");
}
