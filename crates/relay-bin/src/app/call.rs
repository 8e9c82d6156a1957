//! One-shot calls from a non-privileged peer.

use host_actions::{register_all, ActionContext, MemoryHost, RandRoller};
use relay_config_and_utils::Config;
use relay_hub::SocketTransport;
use relay_router::{ActionRegistry, RoleFlag, Router, RouterConfig, RouterResult, Transport};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An action call parsed from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub action: String,
    pub args: Vec<Value>,
    pub timeout: Option<Duration>,
}

impl CallRequest {
    /// Parse the optional JSON payload into the first call argument.
    pub fn new(
        action: String,
        payload: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, serde_json::Error> {
        let args = match payload {
            Some(payload) => vec![serde_json::from_str(payload)?],
            None => Vec::new(),
        };
        Ok(Self {
            action,
            args,
            timeout: timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Forward one call over `transport` and wait for the reply.
pub(crate) async fn call_over(
    config: &Config,
    request: CallRequest,
    transport: Arc<dyn Transport>,
) -> RouterResult<Value> {
    let router = Router::new(
        RouterConfig::new(config.channel.clone(), config.call_timeout()),
        transport,
        Arc::new(RoleFlag::new(false)),
        Arc::new(ActionRegistry::new()),
    );
    router.start();

    let deadline = request.timeout.unwrap_or_else(|| config.call_timeout());
    debug!(action = %request.action, ?deadline, "Calling action");
    let result = router
        .call_with_timeout(&request.action, request.args, deadline)
        .await;

    router.shutdown();
    result
}

/// Connect to the hub and run one call.
pub async fn run_call(
    config: &Config,
    request: CallRequest,
    socket_path: PathBuf,
) -> Result<Value, Box<dyn std::error::Error>> {
    let transport = Arc::new(SocketTransport::connect(&socket_path).await?);
    Ok(call_over(config, request, transport).await?)
}

/// Names of every action the game master registers.
pub async fn action_names() -> Vec<String> {
    let registry = ActionRegistry::new();
    let ctx = ActionContext::new(Arc::new(MemoryHost::default()), Arc::new(RandRoller));
    register_all(&registry, ctx).await;
    registry.names().await
}
