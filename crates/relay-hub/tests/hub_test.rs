//! End-to-end tests through a real hub socket.

use relay_hub::{BroadcastHub, SocketTransport};
use relay_router::{ActionRegistry, RoleFlag, Router, RouterConfig, Transport};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

const CHANNEL: &str = "module.discord-bot-integration";

struct TestHub {
    hub: BroadcastHub,
    _dir: TempDir,
}

impl TestHub {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let hub = BroadcastHub::new(dir.path().join("hub.sock"));
        let listener = hub.bind().unwrap();

        let server = hub.clone();
        tokio::spawn(async move { server.serve(listener).await });

        Self { hub, _dir: dir }
    }

    fn path(&self) -> &Path {
        self.hub.socket_path()
    }

    /// Wait until the hub has picked up `n` peers.
    async fn wait_for_peers(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.hub.connection_count() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("peers connected");
    }
}

async fn read_line(reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>) -> Value {
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(2), reader.read_line(&mut line))
        .await
        .expect("frame arrives")
        .unwrap();
    serde_json::from_str(line.trim()).unwrap()
}

#[tokio::test]
async fn test_frames_reach_every_peer_including_sender() {
    let hub = TestHub::start().await;

    let (a_read, mut a_write) = UnixStream::connect(hub.path()).await.unwrap().into_split();
    let (b_read, _b_write) = UnixStream::connect(hub.path()).await.unwrap().into_split();
    let mut a_read = BufReader::new(a_read);
    let mut b_read = BufReader::new(b_read);
    hub.wait_for_peers(2).await;

    a_write
        .write_all(b"{\"channel\":\"module.test\",\"message\":{\"n\":1}}\n")
        .await
        .unwrap();

    let expected = json!({"channel": "module.test", "message": {"n": 1}});
    assert_eq!(read_line(&mut a_read).await, expected);
    assert_eq!(read_line(&mut b_read).await, expected);
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let hub = TestHub::start().await;

    let (a_read, mut a_write) = UnixStream::connect(hub.path()).await.unwrap().into_split();
    let mut a_read = BufReader::new(a_read);
    hub.wait_for_peers(1).await;

    a_write.write_all(b"not json\n\n{\"message\":1}\n").await.unwrap();
    a_write
        .write_all(b"{\"channel\":\"module.test\",\"message\":\"ok\"}\n")
        .await
        .unwrap();

    assert_eq!(
        read_line(&mut a_read).await,
        json!({"channel": "module.test", "message": "ok"})
    );
}

#[tokio::test]
async fn test_socket_transport_fan_out() {
    let hub = TestHub::start().await;

    let a = SocketTransport::connect(hub.path()).await.unwrap();
    let b = SocketTransport::connect(hub.path()).await.unwrap();
    let mut a_rx = a.subscribe(CHANNEL);
    let mut b_rx = b.subscribe(CHANNEL);
    let mut b_other = b.subscribe("module.other");
    hub.wait_for_peers(2).await;

    a.send(CHANNEL, json!({"action": "actorUpdated", "actorId": "a1"}))
        .unwrap();

    for rx in [&mut a_rx, &mut b_rx] {
        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("message arrives")
            .unwrap();
        assert_eq!(message["action"], "actorUpdated");
    }
    assert!(b_other.try_recv().is_err());
}

#[tokio::test]
async fn test_transport_closes_when_hub_stops() {
    let hub = TestHub::start().await;

    let transport = SocketTransport::connect(hub.path()).await.unwrap();
    let mut rx = transport.subscribe(CHANNEL);
    hub.wait_for_peers(1).await;

    hub.hub.shutdown();

    let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("channel closes");
    assert!(closed.is_err());
    assert!(transport.is_closed());
}

#[tokio::test]
async fn test_routers_call_through_hub() {
    let hub = TestHub::start().await;

    let registry = Arc::new(ActionRegistry::new());
    registry
        .register("ping", |_| async { Ok(json!("pong")) })
        .await;

    let config = RouterConfig::new(CHANNEL, Duration::from_secs(2));
    let gm = Router::new(
        config.clone(),
        Arc::new(SocketTransport::connect(hub.path()).await.unwrap()),
        Arc::new(RoleFlag::new(true)),
        registry.clone(),
    );
    let player = Router::new(
        config,
        Arc::new(SocketTransport::connect(hub.path()).await.unwrap()),
        Arc::new(RoleFlag::new(false)),
        registry,
    );
    gm.start();
    player.start();
    hub.wait_for_peers(2).await;

    assert_eq!(player.call("ping", vec![]).await.unwrap(), json!("pong"));

    let err = player.call("doesNotExist", vec![]).await.unwrap_err();
    assert!(err.is_handler_not_found());
    assert_eq!(player.pending_count(), 0);
}
