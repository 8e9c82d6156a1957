//! Correlated remote call router.
//!
//! Turns a fan-out broadcast channel, where every peer sees every message,
//! into point-to-point asynchronous calls:
//!
//! - every forwarded call gets a fresh request ID and a pending entry
//! - only the peer holding the privileged executor role runs actions
//! - responses are demultiplexed strictly by request ID
//! - every forwarded call has a deadline
//!
//! ```text
//! caller -> Router::call -> [GM?] -> registry handler (in-process)
//!                        -> [else] -> REQUEST broadcast -> GM router -> handler
//!                                                      <- RESPONSE broadcast
//! ```

mod error;
mod pending;
mod registry;
mod role;
mod router;
mod transport;

pub use error::{ActionError, ActionResult, RouterError, RouterResult};
pub use pending::PendingCallInfo;
pub use registry::{ActionFn, ActionFuture, ActionRegistry};
pub use role::{ExecutorRole, RoleFlag};
pub use router::{PendingReply, Router, RouterConfig};
pub use transport::{LocalBus, Transport};
