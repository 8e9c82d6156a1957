//! Broadcast hub for relay peers.
//!
//! The hub listens on a Unix domain socket and speaks newline-delimited
//! [`HubFrame`](relay_protocol_types::HubFrame)s. Every frame any peer
//! writes is delivered to every connected peer, the writer included, which
//! is exactly the fan-out the router expects from its transport.
//!
//! Peers attach with [`SocketTransport`], which implements
//! [`relay_router::Transport`].

mod client;
mod error;
mod hub;

pub use client::SocketTransport;
pub use error::{HubError, HubResult};
pub use hub::BroadcastHub;
