//! Configuration, paths, errors and logging shared by the relay binaries.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
