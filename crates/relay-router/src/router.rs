//! The correlated remote call router.

use crate::pending::PendingCalls;
use crate::{
    ActionRegistry, ExecutorRole, PendingCallInfo, RouterError, RouterResult, Transport,
};
use relay_protocol_types::{
    error_codes, Envelope, Recipient, Request, Response, DEFAULT_CHANNEL,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Broadcast channel shared by every peer.
    pub channel: String,
    /// Default deadline for forwarded calls.
    pub call_timeout: Duration,
}

impl RouterConfig {
    pub fn new(channel: impl Into<String>, call_timeout: Duration) -> Self {
        Self {
            channel: channel.into(),
            call_timeout,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL, Duration::from_secs(30))
    }
}

struct RouterInner {
    config: RouterConfig,
    transport: Arc<dyn Transport>,
    role: Arc<dyn ExecutorRole>,
    registry: Arc<ActionRegistry>,
    pending: Arc<PendingCalls>,
    shutdown_tx: broadcast::Sender<()>,
    stopped: AtomicBool,
}

/// Routes calls either to a local handler or, through the transport, to the
/// peer holding the executor role.
///
/// Cheap to clone; all clones share the same pending-call table.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub fn new(
        config: RouterConfig,
        transport: Arc<dyn Transport>,
        role: Arc<dyn ExecutorRole>,
        registry: Arc<ActionRegistry>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(RouterInner {
                config,
                transport,
                role,
                registry,
                pending: Arc::new(PendingCalls::new()),
                shutdown_tx,
                stopped: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.inner.registry
    }

    pub fn is_privileged_executor(&self) -> bool {
        self.inner.role.is_privileged_executor()
    }

    /// Invoke `action` with the configured default deadline.
    pub async fn call(&self, action: &str, args: Vec<Value>) -> RouterResult<Value> {
        self.call_with_timeout(action, args, self.inner.config.call_timeout)
            .await
    }

    /// Invoke `action`, waiting at most `deadline` for a forwarded reply.
    ///
    /// The executor runs the handler in-process and sends nothing; everyone
    /// else forwards the call over the channel.
    pub async fn call_with_timeout(
        &self,
        action: &str,
        args: Vec<Value>,
        deadline: Duration,
    ) -> RouterResult<Value> {
        if self.is_privileged_executor() {
            return self.execute_local(action, args).await;
        }
        self.forward(action, args)?.wait(deadline).await
    }

    async fn execute_local(&self, action: &str, args: Vec<Value>) -> RouterResult<Value> {
        let handler = self
            .inner
            .registry
            .resolve(action)
            .await
            .ok_or_else(|| RouterError::HandlerNotFound(action.to_string()))?;

        debug!(action = %action, "Executing action locally");
        match tokio::spawn(handler(args)).await {
            Ok(result) => result.map_err(|e| RouterError::ActionFailed {
                action: action.to_string(),
                message: e.to_string(),
                code: e.code(),
            }),
            Err(e) => {
                error!(action = %action, error = %e, "Action panicked");
                Err(RouterError::ActionFailed {
                    action: action.to_string(),
                    message: format!("Action {} aborted: {}", action, e),
                    code: error_codes::INTERNAL_ERROR,
                })
            }
        }
    }

    /// Broadcast a request for `action` and return a handle to its reply.
    ///
    /// The pending entry exists before the request is sent, so even an
    /// immediate response finds it.
    pub fn forward(&self, action: &str, args: Vec<Value>) -> RouterResult<PendingReply> {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return Err(RouterError::ShuttingDown);
        }

        let request = Request::new(action, args);
        let request_id = request.id.clone();
        let message = request.into_envelope().to_value()?;

        let rx = self.inner.pending.insert(&request_id, action);
        if let Err(e) = self.inner.transport.send(&self.inner.config.channel, message) {
            self.inner.pending.remove(&request_id);
            warn!(action = %action, request_id = %request_id, error = %e, "Failed to forward call");
            return Err(e);
        }

        debug!(action = %action, request_id = %request_id, "Forwarded call to executor");
        Ok(PendingReply {
            request_id,
            action: action.to_string(),
            rx,
            pending: Arc::clone(&self.inner.pending),
        })
    }

    /// Abort an outstanding call. Returns `false` if it already settled.
    pub fn cancel(&self, request_id: &str) -> bool {
        match self.inner.pending.remove(request_id) {
            Some(call) => {
                debug!(action = %call.action_name, request_id = %request_id, "Cancelled call");
                let _ = call.reply.send(Err(RouterError::Cancelled {
                    action: call.action_name,
                    request_id: request_id.to_string(),
                }));
                true
            }
            None => false,
        }
    }

    /// Number of outstanding calls.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Outstanding calls, oldest first.
    pub fn pending_calls(&self) -> Vec<PendingCallInfo> {
        self.inner.pending.snapshot()
    }

    /// Single inbound entry point for everything received on the channel.
    ///
    /// Must run inside a tokio runtime: inbound requests are executed on their
    /// own task.
    pub fn handle_message(&self, raw: Value) {
        let envelope = match Envelope::from_value(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(error = %e, "Ignoring non-envelope message");
                return;
            }
        };

        match envelope {
            Envelope::Request(request) => self.handle_request(request),
            Envelope::Response(response) => self.handle_response(response),
        }
    }

    fn holds(&self, recipient: Recipient) -> bool {
        match recipient {
            Recipient::Gm => self.is_privileged_executor(),
        }
    }

    fn handle_request(&self, request: Request) {
        if !self.holds(request.recipient) {
            trace!(
                action = %request.function_name,
                request_id = %request.id,
                "Ignoring request for another role"
            );
            return;
        }

        let router = self.clone();
        tokio::spawn(async move {
            router.execute_request(request).await;
        });
    }

    async fn execute_request(&self, request: Request) {
        let Request {
            id,
            function_name,
            args,
            ..
        } = request;

        let response = match self.inner.registry.resolve(&function_name).await {
            None => {
                warn!(action = %function_name, request_id = %id, "No handler for inbound request");
                Response::error(
                    &id,
                    error_codes::METHOD_NOT_FOUND,
                    &format!("No handler for action: {}", function_name),
                )
            }
            Some(handler) => {
                debug!(action = %function_name, request_id = %id, "Executing inbound request");
                // Own task so a panicking handler still gets an answer
                match tokio::spawn(handler(args)).await {
                    Ok(Ok(result)) => Response::success(&id, result),
                    Ok(Err(e)) => {
                        warn!(action = %function_name, request_id = %id, error = %e, "Action failed");
                        Response::error(&id, e.code(), &e.to_string())
                    }
                    Err(e) => {
                        error!(action = %function_name, request_id = %id, error = %e, "Action panicked");
                        Response::error(
                            &id,
                            error_codes::INTERNAL_ERROR,
                            &format!("Action {} aborted: {}", function_name, e),
                        )
                    }
                }
            }
        };

        self.publish(response.into_envelope());
    }

    fn handle_response(&self, response: Response) {
        let Some(call) = self.inner.pending.remove(&response.id) else {
            trace!(request_id = %response.id, "Dropping response with no pending call");
            return;
        };

        let outcome = match response.error {
            Some(message) => Err(RouterError::Remote {
                action: call.action_name.clone(),
                message,
                code: response.code,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };

        debug!(
            action = %call.action_name,
            request_id = %response.id,
            success = outcome.is_ok(),
            "Received response"
        );
        if call.reply.send(outcome).is_err() {
            trace!(request_id = %response.id, "Caller went away before the response arrived");
        }
    }

    fn publish(&self, envelope: Envelope) {
        let id = envelope.id().to_string();
        match envelope.to_value() {
            Ok(message) => {
                if let Err(e) = self.inner.transport.send(&self.inner.config.channel, message) {
                    warn!(request_id = %id, error = %e, "Failed to publish response");
                }
            }
            Err(e) => error!(request_id = %id, error = %e, "Failed to encode response"),
        }
    }

    /// Subscribe to the channel and spawn the inbound loop.
    ///
    /// The subscription is taken before this returns, so nothing sent
    /// afterwards is missed.
    pub fn start(&self) -> JoinHandle<()> {
        let mut inbound = self.inner.transport.subscribe(&self.inner.config.channel);
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
        let router = self.clone();

        info!(
            channel = %self.inner.config.channel,
            privileged = self.is_privileged_executor(),
            "Router started"
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = inbound.recv() => match message {
                        Ok(raw) => router.handle_message(raw),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Router fell behind the channel, messages dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Channel closed, router stopping");
                            break;
                        }
                    },
                    _ = shutdown_rx.recv() => {
                        debug!("Router loop received shutdown signal");
                        break;
                    }
                }
            }

            let rejected = router.inner.pending.fail_all();
            if rejected > 0 {
                debug!(rejected, "Rejected outstanding calls");
            }
        })
    }

    /// Stop the inbound loop and reject every outstanding call.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _ = self.inner.shutdown_tx.send(());
        let rejected = self.inner.pending.fail_all();
        info!(rejected, "Router shut down");
    }
}

/// Caller's handle on a forwarded call.
///
/// Dropping it before the reply arrives removes the pending entry; a response
/// arriving later is treated as an orphan.
pub struct PendingReply {
    request_id: String,
    action: String,
    rx: oneshot::Receiver<RouterResult<Value>>,
    pending: Arc<PendingCalls>,
}

impl PendingReply {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Wait for the reply, failing with `Timeout` after `deadline`.
    pub async fn wait(mut self, deadline: Duration) -> RouterResult<Value> {
        match tokio::time::timeout(deadline, &mut self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(RouterError::Cancelled {
                action: self.action.clone(),
                request_id: self.request_id.clone(),
            }),
            Err(_) => {
                self.pending.remove(&self.request_id);
                warn!(
                    action = %self.action,
                    request_id = %self.request_id,
                    after = ?deadline,
                    "Call timed out"
                );
                Err(RouterError::Timeout {
                    action: self.action.clone(),
                    request_id: self.request_id.clone(),
                    after: deadline,
                })
            }
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.pending.remove(&self.request_id);
    }
}

impl std::fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReply")
            .field("request_id", &self.request_id)
            .field("action", &self.action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionError, RoleFlag};
    use serde_json::json;
    use tokio::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(1);

    struct RecordingTransport {
        tx: mpsc::UnboundedSender<Value>,
    }

    impl Transport for RecordingTransport {
        fn send(&self, _channel: &str, message: Value) -> RouterResult<()> {
            self.tx
                .send(message)
                .map_err(|e| RouterError::Transport(e.to_string()))
        }

        fn subscribe(&self, _channel: &str) -> broadcast::Receiver<Value> {
            broadcast::channel(1).1
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send(&self, _channel: &str, _message: Value) -> RouterResult<()> {
            Err(RouterError::Transport("socket closed".to_string()))
        }

        fn subscribe(&self, _channel: &str) -> broadcast::Receiver<Value> {
            broadcast::channel(1).1
        }
    }

    async fn registry() -> Arc<ActionRegistry> {
        let registry = Arc::new(ActionRegistry::new());
        registry.register("ping", |_| async { Ok(json!("pong")) }).await;
        registry
            .register("reject", |_| async {
                Err(ActionError::InvalidParams("actorId is required".to_string()))
            })
            .await;
        registry
            .register("explode", |args: Vec<Value>| async move {
                if args.is_empty() {
                    panic!("handler exploded");
                }
                Ok(Value::Null)
            })
            .await;
        registry
    }

    async fn router(privileged: bool) -> (Router, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let router = Router::new(
            RouterConfig::default(),
            Arc::new(RecordingTransport { tx }),
            Arc::new(RoleFlag::new(privileged)),
            registry().await,
        );
        (router, rx)
    }

    fn sent_request(rx: &mut mpsc::UnboundedReceiver<Value>) -> Request {
        let raw = rx.try_recv().expect("a message was sent");
        match Envelope::from_value(raw).unwrap() {
            Envelope::Request(request) => request,
            other => panic!("expected request, got {:?}", other),
        }
    }

    async fn next_response(rx: &mut mpsc::UnboundedReceiver<Value>) -> Response {
        let raw = tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("response published in time")
            .expect("transport open");
        match Envelope::from_value(raw).unwrap() {
            Envelope::Response(response) => response,
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_local_execution_sends_nothing() {
        let (router, mut rx) = router(true).await;

        let result = router.call("ping", vec![]).await.unwrap();

        assert_eq!(result, json!("pong"));
        assert!(rx.try_recv().is_err());
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_local_missing_handler() {
        let (router, mut rx) = router(true).await;

        let err = router.call("doesNotExist", vec![]).await.unwrap_err();

        assert!(matches!(err, RouterError::HandlerNotFound(ref a) if a == "doesNotExist"));
        assert!(err.is_handler_not_found());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_local_handler_error() {
        let (router, _rx) = router(true).await;

        let err = router.call("reject", vec![]).await.unwrap_err();
        match err {
            RouterError::ActionFailed {
                action,
                message,
                code,
            } => {
                assert_eq!(action, "reject");
                assert!(message.contains("actorId is required"));
                assert_eq!(code, error_codes::INVALID_PARAMS);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forward_sends_one_request_and_stays_pending() {
        let (router, mut rx) = router(false).await;

        let reply = router
            .forward("getCharacterStats", vec![json!({"actorId": "a1"})])
            .unwrap();

        let request = sent_request(&mut rx);
        assert!(rx.try_recv().is_err());
        assert_eq!(request.id, reply.request_id());
        assert_eq!(request.function_name, "getCharacterStats");
        assert_eq!(request.args, vec![json!({"actorId": "a1"})]);
        assert_eq!(request.recipient, Recipient::Gm);

        let pending = router.pending_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, reply.request_id());
        assert_eq!(pending[0].action_name, "getCharacterStats");
    }

    #[tokio::test]
    async fn test_request_ids_are_fresh() {
        let (router, _rx) = router(false).await;

        let a = router.forward("ping", vec![]).unwrap();
        let b = router.forward("ping", vec![]).unwrap();

        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(router.pending_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_response_changes_nothing() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("ping", vec![]).unwrap();

        router.handle_message(
            Response::success("not-a-pending-id", json!("pong"))
                .into_envelope()
                .to_value()
                .unwrap(),
        );

        let pending = router.pending_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, reply.request_id());
    }

    #[tokio::test]
    async fn test_round_trip_success() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("ping", vec![]).unwrap();

        router.handle_message(
            Response::success(reply.request_id(), json!("pong"))
                .into_envelope()
                .to_value()
                .unwrap(),
        );

        assert_eq!(reply.wait(WAIT).await.unwrap(), json!("pong"));
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_failure_names_action() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("castSpell", vec![]).unwrap();

        router.handle_message(json!({
            "type": "RESPONSE",
            "id": reply.request_id(),
            "error": "Caster not found",
            "code": error_codes::INTERNAL_ERROR,
        }));

        let err = reply.wait(WAIT).await.unwrap_err();
        assert!(err.to_string().contains("castSpell"));
        assert!(err.to_string().contains("Caster not found"));
        assert!(matches!(
            err,
            RouterError::Remote { code: Some(error_codes::INTERNAL_ERROR), .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_result_resolves_to_null() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("endSession", vec![]).unwrap();

        router.handle_message(json!({"type": "RESPONSE", "id": reply.request_id()}));

        assert_eq!(reply.wait(WAIT).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_legacy_result_tag_resolves() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("ping", vec![]).unwrap();

        router.handle_message(json!({
            "type": "RESULT",
            "requestId": reply.request_id(),
            "result": "pong",
        }));

        assert_eq!(reply.wait(WAIT).await.unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn test_reverse_order_responses_do_not_cross() {
        let (router, _rx) = router(false).await;
        let replies: Vec<PendingReply> = (0..5)
            .map(|_| router.forward("ping", vec![]).unwrap())
            .collect();

        for (i, reply) in replies.iter().enumerate().rev() {
            router.handle_message(
                Response::success(reply.request_id(), json!(i))
                    .into_envelope()
                    .to_value()
                    .unwrap(),
            );
        }

        for (i, reply) in replies.into_iter().enumerate() {
            assert_eq!(reply.wait(WAIT).await.unwrap(), json!(i));
        }
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_removes_pending_call() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("rollInitiative", vec![]).unwrap();
        let id = reply.request_id().to_string();

        let err = reply.wait(Duration::from_millis(20)).await.unwrap_err();
        match err {
            RouterError::Timeout {
                action, request_id, ..
            } => {
                assert_eq!(action, "rollInitiative");
                assert_eq!(request_id, id);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(router.pending_calls().is_empty());

        // Late response is an orphan
        router.handle_message(json!({"type": "RESPONSE", "id": id, "result": 12}));
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_call_times_out_without_executor() {
        let (router, _rx) = router(false).await;

        let err = router
            .call_with_timeout("ping", vec![], Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(err, RouterError::Timeout { .. }));
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_reply_cancels() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("ping", vec![]).unwrap();
        assert_eq!(router.pending_calls().len(), 1);

        drop(reply);
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("ping", vec![]).unwrap();
        let id = reply.request_id().to_string();

        assert!(router.cancel(&id));
        assert!(!router.cancel(&id));

        let err = reply.wait(WAIT).await.unwrap_err();
        assert!(matches!(err, RouterError::Cancelled { ref action, .. } if action == "ping"));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_outstanding_calls() {
        let (router, _rx) = router(false).await;
        let reply = router.forward("ping", vec![]).unwrap();

        router.shutdown();

        assert!(matches!(
            reply.wait(WAIT).await,
            Err(RouterError::ShuttingDown)
        ));
        assert!(matches!(
            router.forward("ping", vec![]),
            Err(RouterError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn test_send_failure_leaves_nothing_pending() {
        let router = Router::new(
            RouterConfig::default(),
            Arc::new(FailingTransport),
            Arc::new(RoleFlag::new(false)),
            registry().await,
        );

        let err = router.forward("ping", vec![]).unwrap_err();
        assert!(matches!(err, RouterError::Transport(_)));
        assert!(router.pending_calls().is_empty());
    }

    #[tokio::test]
    async fn test_executor_answers_request() {
        let (router, mut rx) = router(true).await;

        let request = Request::new("ping", vec![]);
        router.handle_message(request.clone().into_envelope().to_value().unwrap());

        let response = next_response(&mut rx).await;
        assert_eq!(response.id, request.id);
        assert_eq!(response.result, Some(json!("pong")));
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_executor_answers_unknown_action() {
        let (router, mut rx) = router(true).await;

        let request = Request::new("doesNotExist", vec![]);
        router.handle_message(request.clone().into_envelope().to_value().unwrap());

        let response = next_response(&mut rx).await;
        assert_eq!(response.id, request.id);
        assert_eq!(response.code, Some(error_codes::METHOD_NOT_FOUND));
        assert!(response.error.unwrap().contains("doesNotExist"));
    }

    #[tokio::test]
    async fn test_executor_reports_handler_error() {
        let (router, mut rx) = router(true).await;

        router.handle_message(
            Request::new("reject", vec![])
                .into_envelope()
                .to_value()
                .unwrap(),
        );

        let response = next_response(&mut rx).await;
        assert_eq!(response.code, Some(error_codes::INVALID_PARAMS));
        assert!(!response.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_executor_survives_panicking_handler() {
        let (router, mut rx) = router(true).await;

        router.handle_message(
            Request::new("explode", vec![])
                .into_envelope()
                .to_value()
                .unwrap(),
        );

        let response = next_response(&mut rx).await;
        assert_eq!(response.code, Some(error_codes::INTERNAL_ERROR));
        assert!(response.error.unwrap().contains("explode"));

        router.handle_message(Request::new("ping", vec![]).into_envelope().to_value().unwrap());
        assert_eq!(next_response(&mut rx).await.result, Some(json!("pong")));
    }

    #[tokio::test]
    async fn test_local_panicking_handler_fails_the_call() {
        let (router, mut rx) = router(true).await;

        let err = router.call("explode", vec![]).await.unwrap_err();
        match err {
            RouterError::ActionFailed { action, code, .. } => {
                assert_eq!(action, "explode");
                assert_eq!(code, error_codes::INTERNAL_ERROR);
            }
            other => panic!("expected ActionFailed, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());

        assert_eq!(router.call("ping", vec![]).await.unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn test_non_executor_ignores_requests() {
        let (router, mut rx) = router(false).await;

        router.handle_message(Request::new("ping", vec![]).into_envelope().to_value().unwrap());

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_envelope_messages_are_ignored() {
        let (router, mut rx) = router(true).await;

        router.handle_message(json!({"action": "actorUpdated", "actorId": "a1"}));
        router.handle_message(json!("just a string"));
        router.handle_message(json!({"type": "SOMETHING_ELSE", "id": "x"}));

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
