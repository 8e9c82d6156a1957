//! Privileged executor predicate.

use std::sync::atomic::{AtomicBool, Ordering};

/// Decides whether this process is the privileged executor ("GM").
///
/// The router consults this one predicate both when choosing between local
/// execution and forwarding, and before answering an inbound request.
pub trait ExecutorRole: Send + Sync {
    fn is_privileged_executor(&self) -> bool;
}

/// Role backed by an atomic flag, for peers whose role can change at runtime.
#[derive(Debug, Default)]
pub struct RoleFlag(AtomicBool);

impl RoleFlag {
    pub fn new(privileged: bool) -> Self {
        Self(AtomicBool::new(privileged))
    }

    pub fn set(&self, privileged: bool) {
        self.0.store(privileged, Ordering::SeqCst);
    }
}

impl ExecutorRole for RoleFlag {
    fn is_privileged_executor(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
