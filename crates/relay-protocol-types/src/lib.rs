//! Wire types shared by every peer on the relay channel.
//!
//! Two kinds of traffic share one broadcast channel:
//! - correlated call envelopes ([`Envelope`]), tagged by `type`
//! - fire-and-forget host notifications ([`Notification`]), tagged by `action`
//!
//! Peers talking to the broadcast hub wrap either of them in a [`HubFrame`].

mod envelope;
mod frame;
mod notification;

pub use envelope::{error_codes, Envelope, Recipient, Request, Response};
pub use frame::HubFrame;
pub use notification::{Notification, NotificationKind};

/// Default channel shared by all peers of one session.
pub const DEFAULT_CHANNEL: &str = "module.discord-bot-integration";
