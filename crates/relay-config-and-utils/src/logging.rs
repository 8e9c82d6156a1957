//! Logging initialization for relay binaries.
//!
//! Every binary calls [`init_logging`] once at startup and then uses plain
//! `tracing` macros. `RUST_LOG` takes precedence over the configured level.
//! Set `TABLETOP_RELAY_LOG_FORMAT=json` for JSON lines on stderr.

use tracing_subscriber::EnvFilter;

const ENV_LOG_FORMAT: &str = "TABLETOP_RELAY_LOG_FORMAT";

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
