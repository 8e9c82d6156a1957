//! Peer-side transport over the hub socket.

use crate::{HubError, HubResult};
use parking_lot::Mutex;
use relay_protocol_types::HubFrame;
use relay_router::{RouterError, RouterResult, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct Channels {
    senders: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    closed: AtomicBool,
}

impl Channels {
    fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value> {
        let mut senders = self.senders.lock();
        if self.closed.load(Ordering::SeqCst) {
            // Sender dropped here, so the receiver reports Closed at once
            return broadcast::channel(1).1;
        }
        senders
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn deliver(&self, frame: HubFrame) {
        let senders = self.senders.lock();
        match senders.get(&frame.channel) {
            Some(sender) => {
                let _ = sender.send(frame.message);
            }
            None => trace!(channel = %frame.channel, "No subscribers for channel"),
        }
    }

    fn close(&self) {
        let mut senders = self.senders.lock();
        self.closed.store(true, Ordering::SeqCst);
        senders.clear();
    }
}

/// Connection to a [`BroadcastHub`](crate::BroadcastHub), usable as a router
/// transport.
///
/// Subscribers of a channel see the channel close when the hub goes away.
/// There is no reconnect.
pub struct SocketTransport {
    outbound: mpsc::UnboundedSender<String>,
    channels: Arc<Channels>,
}

impl SocketTransport {
    /// Connect to the hub listening at `socket_path`.
    pub async fn connect(socket_path: impl AsRef<Path>) -> HubResult<Self> {
        let socket_path = socket_path.as_ref();
        let stream = UnixStream::connect(socket_path).await.map_err(|e| {
            HubError::Socket(format!(
                "Failed to connect to {}: {}",
                socket_path.display(),
                e
            ))
        })?;
        debug!(path = %socket_path.display(), "Connected to broadcast hub");

        let (reader, writer) = stream.into_split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let channels = Arc::new(Channels::default());

        tokio::spawn(write_frames(writer, outbound_rx));
        tokio::spawn(read_frames(reader, Arc::clone(&channels)));

        Ok(Self { outbound, channels })
    }

    /// True once the hub connection has been lost.
    pub fn is_closed(&self) -> bool {
        self.channels.closed.load(Ordering::SeqCst) || self.outbound.is_closed()
    }
}

impl Transport for SocketTransport {
    fn send(&self, channel: &str, message: Value) -> RouterResult<()> {
        let line = HubFrame::new(channel, message).to_json()?;
        self.outbound
            .send(line)
            .map_err(|_| RouterError::Transport(HubError::ConnectionClosed.to_string()))
    }

    fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value> {
        self.channels.subscribe(channel)
    }
}

async fn write_frames(mut writer: OwnedWriteHalf, mut outbound: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = outbound.recv().await {
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!(error = %e, "Failed to write to hub, dropping connection");
            break;
        }
    }
}

async fn read_frames(reader: OwnedReadHalf, channels: Arc<Channels>) {
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match HubFrame::from_json(trimmed) {
                    Ok(frame) => channels.deliver(frame),
                    Err(e) => warn!(error = %e, "Ignoring malformed frame from hub"),
                }
            }
            Ok(None) => {
                debug!("Hub closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read from hub");
                break;
            }
        }
    }

    channels.close();
}
