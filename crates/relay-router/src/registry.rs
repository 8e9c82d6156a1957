//! Action registry: name to handler, first registration wins.

use crate::ActionResult;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Boxed future returned by an action handler.
pub type ActionFuture = Pin<Box<dyn Future<Output = ActionResult> + Send>>;

/// Handler function type for actions. Receives the positional call arguments.
pub type ActionFn = Arc<dyn Fn(Vec<Value>) -> ActionFuture + Send + Sync>;

/// Registry of business actions, independent of any transport.
pub struct ActionRegistry {
    handlers: RwLock<HashMap<String, ActionFn>>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler under `name`.
    ///
    /// Returns `false` and keeps the existing binding if `name` is taken.
    pub async fn register<F, Fut>(&self, name: &str, handler: F) -> bool
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(name) {
            warn!(action = %name, "Action already registered, keeping the first handler");
            return false;
        }

        let boxed: ActionFn = Arc::new(move |args| Box::pin(handler(args)));
        handlers.insert(name.to_string(), boxed);
        debug!(action = %name, "Registered action");
        true
    }

    /// Look up the handler for `name`.
    pub async fn resolve(&self, name: &str) -> Option<ActionFn> {
        self.handlers.read().await.get(name).cloned()
    }

    /// Registered action names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered actions.
    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    /// True if nothing is registered.
    pub async fn is_empty(&self) -> bool {
        self.handlers.read().await.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
