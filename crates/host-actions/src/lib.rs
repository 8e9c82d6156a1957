//! Business actions for the tabletop relay.
//!
//! - [`HostStore`]: the host collaborator owning all game state, with an
//!   in-memory implementation ([`MemoryHost`]) loaded from a world file
//! - [`register_all`]: registers every business action into a router's
//!   [`ActionRegistry`](relay_router::ActionRegistry)
//! - [`NotificationRelay`]: publishes host events to the bot

mod dice;
mod entity;
mod error;
mod host;
mod memory;
mod notify;

pub mod handlers;

pub use dice::{ability_modifier, DiceRoller, FixedRoller, RandRoller, Roll};
pub use entity::{merge, patch_at, Combatant, Entity, EntityKind};
pub use error::{HostError, HostResult};
pub use handlers::{register_all, ActionContext};
pub use host::{HostEvent, HostStore};
pub use memory::{ChatEntry, MemoryHost, World};
pub use notify::NotificationRelay;
