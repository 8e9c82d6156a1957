//! Broadcast hub command.

use relay_hub::BroadcastHub;
use std::path::PathBuf;
use tracing::{info, warn};

/// Run the hub until Ctrl-C.
pub async fn run_hub(socket_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let hub = BroadcastHub::new(socket_path);

    let shutdown_tx = hub.shutdown_sender();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, stopping hub");
                let _ = shutdown_tx.send(());
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    hub.run().await?;
    info!("Hub stopped");
    Ok(())
}
