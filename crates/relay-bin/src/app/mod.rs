//! Command wiring.

mod call;
mod gm;
mod hub;

pub use call::{action_names, run_call, CallRequest};
pub use gm::run_gm;
pub use hub::run_hub;
