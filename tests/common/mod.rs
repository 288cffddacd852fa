//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, LogData, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use poap_feed::blockchain::decode::Transfer;
use poap_feed::blockchain::{BlockchainError, BlockchainResult, LogSource, LogStream};
use poap_feed::config::FeedConfig;

pub const TEST_API_KEY: &str = "test-api-key";
pub const POAP_CONTRACT: &str = "0x22C1f6050E56d2876009903609a2cC3fEf83B415";

/// A request seen by the mock API.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub path: String,
    pub api_key: Option<String>,
}

/// Response produced by a mock API handler.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self::json(status, json!({"error": "mock"}))
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Programmable mock REST backend on a raw TCP listener.
pub struct MockApi {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockApi {
    /// Start the backend on an ephemeral port.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&MockRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    recorded.lock().unwrap().push(request.clone());

                    let response = handler(&request);
                    if !response.delay.is_zero() {
                        tokio::time::sleep(response.delay).await;
                    }

                    let reason = reqwest::StatusCode::from_u16(response.status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("Unknown");
                    let raw = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        response.status,
                        reason,
                        response.body.len(),
                        response.body
                    );
                    let _ = socket.write_all(raw.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path starts with `prefix`.
    pub fn hits(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.lines();
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let api_key = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("x-api-key")
            .then(|| value.trim().to_string())
    });

    Some(MockRequest { path, api_key })
}

/// Handler answering like the POAP API: every recipient holds `power`
/// tokens and reverse-resolves to `ens`.
pub fn poap_api(power: usize, ens: Option<&'static str>) -> impl Fn(&MockRequest) -> MockResponse {
    move |request| poap_response(request, power, ens)
}

pub fn poap_response(request: &MockRequest, power: usize, ens: Option<&str>) -> MockResponse {
    let path = request.path.as_str();
    if let Some(token_id) = path.strip_prefix("/token/") {
        MockResponse::json(
            200,
            json!({
                "tokenId": token_id,
                "event": {"id": 1, "name": "Test Event"},
                "owner": "0x000000000000000000000000000000000000abcd",
            }),
        )
    } else if path.starts_with("/actions/scan/") {
        let holdings: Vec<Value> = (0..power).map(|i| json!({"tokenId": i.to_string()})).collect();
        MockResponse::json(200, Value::Array(holdings))
    } else if path.starts_with("/actions/ens_lookup/") {
        match ens {
            Some(name) => MockResponse::json(200, json!({"valid": true, "ens": name})),
            None => MockResponse::json(200, json!({"valid": false})),
        }
    } else {
        MockResponse::status(404)
    }
}

/// One `subscribe()` outcome of a [`ScriptedSource`].
pub enum Script {
    /// Connection attempt fails.
    Fail(&'static str),
    /// Deliver these logs, then the connection drops.
    Logs(Vec<Log>),
    /// Deliver these logs and stay connected.
    LogsThenHold(Vec<Log>),
    /// Deliver logs as they are pushed into the channel.
    Channel(mpsc::UnboundedReceiver<Log>),
    /// Deliver these stream items, errors included, and stay connected.
    Items(Vec<BlockchainResult<Log>>),
}

/// Log source replaying one script per subscribe call.
///
/// Once the scripts run out every further attempt fails.
pub struct ScriptedSource {
    scripts: Mutex<VecDeque<Script>>,
    subscribes: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            subscribes: AtomicUsize::new(0),
        })
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }
}

impl LogSource for ScriptedSource {
    fn endpoint(&self) -> &str {
        "scripted://node"
    }

    fn subscribe(&self) -> BoxFuture<'_, BlockchainResult<LogStream>> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front();

        Box::pin(async move {
            let stream: LogStream = match script {
                Some(Script::Fail(reason)) => {
                    return Err(BlockchainError::Connection {
                        url: "scripted://node".to_string(),
                        reason: reason.to_string(),
                    })
                }
                Some(Script::Logs(logs)) => Box::pin(stream::iter(logs.into_iter().map(Ok))),
                Some(Script::LogsThenHold(logs)) => Box::pin(
                    stream::iter(logs.into_iter().map(Ok)).chain(stream::pending()),
                ),
                Some(Script::Channel(rx)) => Box::pin(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|log| (Ok(log), rx))
                })),
                Some(Script::Items(items)) => {
                    Box::pin(stream::iter(items).chain(stream::pending()))
                }
                None => {
                    return Err(BlockchainError::Connection {
                        url: "scripted://node".to_string(),
                        reason: "script exhausted".to_string(),
                    })
                }
            };
            Ok(stream)
        })
    }
}

/// Build a `Transfer` log for the POAP contract.
///
/// `tx` becomes the last byte of the transaction hash.
pub fn transfer_log(from: Address, to: Address, token_id: u64, tx: u8) -> Log {
    let event = Transfer {
        from,
        to,
        tokenId: U256::from(token_id),
    };
    Log {
        inner: alloy::primitives::Log {
            address: POAP_CONTRACT.parse().unwrap(),
            data: event.encode_log_data(),
        },
        transaction_hash: Some(B256::with_last_byte(tx)),
        ..Default::default()
    }
}

/// Transfer between two ordinary accounts.
pub fn plain_transfer(token_id: u64, tx: u8) -> Log {
    transfer_log(holder(1), holder(2), token_id, tx)
}

/// A log that is not a `Transfer` event.
pub fn foreign_log(tx: u8) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: POAP_CONTRACT.parse().unwrap(),
            data: LogData::new_unchecked(vec![B256::with_last_byte(0xee)], Bytes::new()),
        },
        transaction_hash: Some(B256::with_last_byte(tx)),
        ..Default::default()
    }
}

/// Deterministic non-zero account address.
pub fn holder(n: u8) -> Address {
    Address::with_last_byte(n)
}

/// Configuration pointing at a mock API with test-friendly timings.
pub fn test_config(api_base_url: &str) -> FeedConfig {
    let mut config = FeedConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.nodes.xdai_ws_url = "ws://127.0.0.1:1".to_string();
    config.nodes.mainnet_ws_url = "ws://127.0.0.1:1".to_string();
    config.contract.address = POAP_CONTRACT.to_string();
    config.api.base_url = api_base_url.to_string();
    config.api.api_key = TEST_API_KEY.to_string();
    config.api.request_timeout_secs = 5;
    config.api.retry.base_delay_ms = 10;
    config.enrichment.settle_delay_ms = 0;
    config.reconnect.delay_ms = 10;
    config.reconnect.max_attempts = 3;
    config
}

/// Wait for the next message or panic after `timeout`.
pub async fn recv_within(rx: &mut mpsc::UnboundedReceiver<Arc<str>>, timeout: Duration) -> Value {
    let payload = tokio::time::timeout(timeout, rx.recv())
        .await
        .expect("timed out waiting for broadcast")
        .expect("sink channel closed");
    serde_json::from_str(&payload).unwrap()
}

/// Assert nothing arrives within `window`.
pub async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<Arc<str>>, window: Duration) {
    if let Ok(Some(payload)) = tokio::time::timeout(window, rx.recv()).await {
        panic!("unexpected broadcast: {}", payload);
    }
}
