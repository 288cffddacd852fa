//! End-to-end tests: scripted node → enrichment → WebSocket clients.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use futures_util::{SinkExt, StreamExt};
use poap_feed::blockchain::{BlockchainError, LogSource, Network};
use poap_feed::broadcast::BroadcastHub;
use poap_feed::lifecycle::{Feed, Shutdown, StartupError};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

mod common;

use common::{MockApi, Script, ScriptedSource};

const WAIT: Duration = Duration::from_secs(5);

struct Running {
    addr: std::net::SocketAddr,
    hub: BroadcastHub,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), StartupError>>,
}

async fn start_feed(config: &poap_feed::FeedConfig, sources: Vec<(Network, Arc<dyn LogSource>)>) -> Running {
    let feed = Feed::with_sources(config, sources, Shutdown::new()).await.unwrap();
    let addr = feed.local_addr().unwrap();
    let hub = feed.hub().clone();
    let (stop, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(feed.run(async {
        let _ = stop_rx.await;
    }));

    Running { addr, hub, stop, task }
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached");
}

async fn next_record<S>(socket: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("timed out waiting for record")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn get_status(addr: std::net::SocketAddr) -> Value {
    reqwest::get(format!("http://{}/status", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_clients_receive_enriched_transfer() {
    let api = MockApi::start(common::poap_api(7, Some("alice.eth"))).await;
    let config = common::test_config(&api.base_url());
    let (log_tx, log_rx) = mpsc::unbounded_channel();
    let source: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::Channel(log_rx)]);

    let running = start_feed(&config, vec![(Network::Xdai, source)]).await;

    let (mut alice, _) = connect_async(format!("ws://{}/", running.addr)).await.unwrap();
    let (mut bob, _) = connect_async(format!("ws://{}/", running.addr)).await.unwrap();
    let hub = running.hub.clone();
    wait_until(move || hub.connection_count() == 2).await;

    // Client frames are ignored.
    alice.send(Message::Text("hello".into())).await.unwrap();

    log_tx
        .send(common::transfer_log(Address::ZERO, common::holder(7), 42, 0x01))
        .unwrap();

    for socket in [&mut alice, &mut bob] {
        let record = next_record(socket).await;
        assert_eq!(record["action"], "mint");
        assert_eq!(record["poapPower"], 7);
        assert_eq!(record["powerEmoji"], "🟢");
        assert_eq!(record["ens"], "alice.eth");
        assert_eq!(record["tokenId"], "42");
    }

    running.stop.send(()).unwrap();
    let result = timeout(WAIT, running.task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_disconnected_client_is_unregistered() {
    let api = MockApi::start(common::poap_api(1, None)).await;
    let config = common::test_config(&api.base_url());
    let source: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::LogsThenHold(vec![])]);

    let running = start_feed(&config, vec![(Network::Xdai, source)]).await;

    let (mut socket, _) = connect_async(format!("ws://{}/", running.addr)).await.unwrap();
    let hub = running.hub.clone();
    wait_until(move || hub.connection_count() == 1).await;

    socket.close(None).await.unwrap();
    let hub = running.hub.clone();
    wait_until(move || hub.connection_count() == 0).await;

    running.stop.send(()).unwrap();
    let _ = timeout(WAIT, running.task).await;
}

#[tokio::test]
async fn test_status_and_health() {
    let api = MockApi::start(common::poap_api(1, None)).await;
    let config = common::test_config(&api.base_url());
    let xdai: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::LogsThenHold(vec![])]);
    let mainnet: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::LogsThenHold(vec![])]);

    let running = start_feed(&config, vec![(Network::Xdai, xdai), (Network::Mainnet, mainnet)]).await;

    let health = reqwest::get(format!("http://{}/health", running.addr)).await.unwrap();
    assert_eq!(health.status().as_u16(), 200);
    assert_eq!(health.text().await.unwrap(), "ok");

    let addr = running.addr;
    let status = timeout(WAIT, async {
        loop {
            let status = get_status(addr).await;
            if status["status"] == "operational" {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("feed never became operational");

    assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(status["clients"], 0);
    let networks = status["networks"].as_array().unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[0]["network"], "xdai");
    assert_eq!(networks[0]["phase"], "subscribed");
    assert_eq!(networks[1]["network"], "mainnet");

    running.stop.send(()).unwrap();
    let _ = timeout(WAIT, running.task).await;
}

#[tokio::test]
async fn test_shutdown_closes_clients() {
    let api = MockApi::start(common::poap_api(1, None)).await;
    let config = common::test_config(&api.base_url());
    let source: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::LogsThenHold(vec![])]);

    let running = start_feed(&config, vec![(Network::Xdai, source)]).await;
    let (mut socket, _) = connect_async(format!("ws://{}/", running.addr)).await.unwrap();
    let hub = running.hub.clone();
    wait_until(move || hub.connection_count() == 1).await;

    running.stop.send(()).unwrap();

    let closed = timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    let result = timeout(WAIT, running.task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_fatal_exhaustion_stops_feed() {
    let api = MockApi::start(common::poap_api(1, None)).await;
    let mut config = common::test_config(&api.base_url());
    config.reconnect.max_attempts = 1;
    config.reconnect.fatal_on_exhaustion = true;
    let source: Arc<dyn LogSource> = ScriptedSource::new(vec![]);

    let feed = Feed::with_sources(&config, vec![(Network::Mainnet, source)], Shutdown::new())
        .await
        .unwrap();
    let result = timeout(WAIT, feed.run(std::future::pending()))
        .await
        .expect("feed kept running");

    assert!(matches!(
        result,
        Err(StartupError::Blockchain(BlockchainError::ReconnectExhausted {
            network: Network::Mainnet,
            attempts: 1
        }))
    ));
}

#[tokio::test]
async fn test_non_fatal_exhaustion_keeps_serving() {
    let api = MockApi::start(common::poap_api(1, None)).await;
    let mut config = common::test_config(&api.base_url());
    config.reconnect.max_attempts = 1;
    let failing: Arc<dyn LogSource> = ScriptedSource::new(vec![]);
    let healthy: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::LogsThenHold(vec![])]);

    let running = start_feed(&config, vec![(Network::Xdai, failing), (Network::Mainnet, healthy)]).await;

    let addr = running.addr;
    let status = timeout(WAIT, async {
        loop {
            let status = get_status(addr).await;
            if status["networks"][0]["phase"] == "failed" {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("xdai never failed");

    assert_eq!(status["status"], "degraded");
    assert!(!running.task.is_finished());

    running.stop.send(()).unwrap();
    let result = timeout(WAIT, running.task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bind_failure_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api = MockApi::start(common::poap_api(1, None)).await;
    let mut config = common::test_config(&api.base_url());
    config.listener.bind_address = taken.local_addr().unwrap().to_string();
    let source: Arc<dyn LogSource> = ScriptedSource::new(vec![Script::LogsThenHold(vec![])]);

    let result = Feed::with_sources(&config, vec![(Network::Xdai, source)], Shutdown::new()).await;
    assert!(matches!(result, Err(StartupError::Bind { .. })));
}
