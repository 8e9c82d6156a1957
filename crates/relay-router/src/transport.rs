//! Transport adapter over a broadcast channel.

use crate::RouterResult;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::trace;

/// Default per-channel buffer for in-process delivery.
const DEFAULT_CAPACITY: usize = 256;

/// Multicast publish/subscribe over named channels.
///
/// Every subscriber of a channel receives every message sent on it, the
/// sender's own messages included. Delivery is ordered and at most once; no
/// guarantee survives a reconnect.
pub trait Transport: Send + Sync + 'static {
    /// Publish `message` to every peer subscribed to `channel`.
    fn send(&self, channel: &str, message: Value) -> RouterResult<()>;

    /// Receive every message published on `channel` from now on.
    fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value>;
}

/// In-process broadcast bus. Every router attached to it is a peer.
pub struct LocalBus {
    channels: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<Value> {
        let mut channels = self.channels.lock();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscribers on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalBus {
    fn send(&self, channel: &str, message: Value) -> RouterResult<()> {
        // No subscribers is not an error on a broadcast bus
        if self.sender(channel).send(message).is_err() {
            trace!(channel = %channel, "Message published with no subscribers");
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value> {
        self.sender(channel).subscribe()
    }
}
