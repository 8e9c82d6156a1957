//! Game master peer: owns the host and executes every action.

use host_actions::{
    register_all, ActionContext, HostStore, MemoryHost, NotificationRelay, RandRoller,
};
use relay_config_and_utils::Config;
use relay_hub::SocketTransport;
use relay_router::{ActionRegistry, Router, RouterConfig, Transport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A running game master: router plus notification relay.
pub(crate) struct GmPeer {
    pub router: Router,
    pub relay: NotificationRelay,
    router_task: JoinHandle<()>,
}

impl GmPeer {
    /// Register all actions against `host` and start serving on `transport`.
    pub async fn start(
        config: &Config,
        host: Arc<MemoryHost>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        if !HostStore::is_privileged_executor(host.as_ref()) {
            warn!("World is not marked privileged, this peer will forward instead of execute");
        }

        let registry = Arc::new(ActionRegistry::new());
        register_all(
            &registry,
            ActionContext::new(host.clone(), Arc::new(RandRoller)),
        )
        .await;

        let router = Router::new(
            RouterConfig::new(config.channel.clone(), config.call_timeout()),
            transport.clone(),
            host.clone(),
            registry,
        );
        let router_task = router.start();

        let relay = NotificationRelay::new(host, transport, config.channel.clone())
            .with_notification_channel(config.notification_channel.clone());
        relay.start();

        Self {
            router,
            relay,
            router_task,
        }
    }

    /// Wait until the router loop ends, i.e. the hub connection closed.
    pub async fn closed(&mut self) {
        let _ = (&mut self.router_task).await;
    }

    pub fn shutdown(&self) {
        self.relay.shutdown();
        self.router.shutdown();
    }
}

/// Run the game master until Ctrl-C or until the hub goes away.
pub async fn run_gm(
    config: &Config,
    world: &Path,
    socket_path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = Arc::new(MemoryHost::load(world)?);
    let transport = Arc::new(SocketTransport::connect(&socket_path).await?);

    let mut peer = GmPeer::start(config, host, transport).await;
    info!(
        world = %world.display(),
        socket = %socket_path.display(),
        channel = %config.channel,
        "Game master ready"
    );

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Received Ctrl-C, stopping game master");
        }
        _ = peer.closed() => {
            warn!("Hub connection lost, stopping game master");
        }
    }

    peer.shutdown();
    Ok(())
}
