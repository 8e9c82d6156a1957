//! Broadcast hub server.

use crate::HubResult;
use relay_protocol_types::HubFrame;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Frames buffered per connection before a slow reader starts lagging.
const FRAME_BUFFER: usize = 1024;

/// Re-broadcasts every frame from every connection to all connections.
#[derive(Clone)]
pub struct BroadcastHub {
    socket_path: PathBuf,
    frames_tx: broadcast::Sender<Arc<str>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BroadcastHub {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        let (frames_tx, _) = broadcast::channel(FRAME_BUFFER);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            socket_path: socket_path.into(),
            frames_tx,
            shutdown_tx,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Number of connected peers.
    pub fn connection_count(&self) -> usize {
        self.frames_tx.receiver_count()
    }

    /// Get a shutdown sender (for signal handlers).
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Stop accepting and close every connection.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Bind the socket, replacing a stale socket file.
    pub fn bind(&self) -> HubResult<UnixListener> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path.display(), "Broadcast hub listening");
        Ok(listener)
    }

    /// Bind and serve until shutdown.
    pub async fn run(&self) -> HubResult<()> {
        let listener = self.bind()?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener until shutdown.
    pub async fn serve(&self, listener: UnixListener) -> HubResult<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let frames_tx = self.frames_tx.clone();
                            let shutdown_rx = self.shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, frames_tx, shutdown_rx).await {
                                    error!(error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Broadcast hub shutting down");
                    break;
                }
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
        Ok(())
    }
}

/// Pump one peer: its frames go to everyone, everyone's frames go to it.
async fn handle_connection(
    stream: UnixStream,
    frames_tx: broadcast::Sender<Arc<str>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> HubResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut frames_rx = frames_tx.subscribe();

    debug!(peers = frames_tx.receiver_count(), "Peer connected");

    loop {
        tokio::select! {
            // next_line is cancel safe, read_line is not
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Peer disconnected");
                    break;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match HubFrame::from_json(trimmed) {
                    Ok(frame) => {
                        trace!(channel = %frame.channel, "Relaying frame");
                        let _ = frames_tx.send(Arc::from(trimmed));
                    }
                    Err(e) => warn!(error = %e, "Dropping malformed frame"),
                }
            }

            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        writer.write_all(frame.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "Peer lagged, skipped frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = shutdown_rx.recv() => {
                debug!("Closing peer connection for shutdown");
                break;
            }
        }
    }

    Ok(())
}
