//! Caller-side table of calls awaiting a response.

use crate::{RouterError, RouterResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// One outstanding call. Settled exactly once through `reply`.
pub(crate) struct PendingCall {
    pub action_name: String,
    pub created_at: DateTime<Utc>,
    pub reply: oneshot::Sender<RouterResult<Value>>,
}

/// Diagnostic view of an outstanding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCallInfo {
    pub request_id: String,
    pub action_name: String,
    pub created_at: DateTime<Utc>,
}

/// Pending calls keyed by request ID.
///
/// Only insert, remove and snapshot by key; the lock is never held across an
/// await point.
#[derive(Default)]
pub(crate) struct PendingCalls {
    calls: Mutex<HashMap<String, PendingCall>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new call and return the receiving half of its reply.
    pub fn insert(
        &self,
        request_id: &str,
        action_name: &str,
    ) -> oneshot::Receiver<RouterResult<Value>> {
        let (reply, rx) = oneshot::channel();
        self.calls.lock().insert(
            request_id.to_string(),
            PendingCall {
                action_name: action_name.to_string(),
                created_at: Utc::now(),
                reply,
            },
        );
        rx
    }

    /// Remove and return the call for `request_id`, if still outstanding.
    pub fn remove(&self, request_id: &str) -> Option<PendingCall> {
        self.calls.lock().remove(request_id)
    }

    /// Reject every outstanding call with `ShuttingDown`.
    pub fn fail_all(&self) -> usize {
        let drained: Vec<PendingCall> = self.calls.lock().drain().map(|(_, call)| call).collect();
        let count = drained.len();
        for call in drained {
            let _ = call.reply.send(Err(RouterError::ShuttingDown));
        }
        count
    }

    pub fn snapshot(&self) -> Vec<PendingCallInfo> {
        let mut calls: Vec<PendingCallInfo> = self
            .calls
            .lock()
            .iter()
            .map(|(id, call)| PendingCallInfo {
                request_id: id.clone(),
                action_name: call.action_name.clone(),
                created_at: call.created_at,
            })
            .collect();
        calls.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        calls
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }
}
