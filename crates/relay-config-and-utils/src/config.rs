//! Configuration management for the relay.

use crate::{CoreError, CoreResult, Paths};
use relay_protocol_types::DEFAULT_CHANNEL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default deadline for a forwarded call.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

const ENV_LOG_LEVEL: &str = "TABLETOP_RELAY_LOG_LEVEL";
const ENV_CHANNEL: &str = "TABLETOP_RELAY_CHANNEL";
const ENV_CALL_TIMEOUT_SECS: &str = "TABLETOP_RELAY_CALL_TIMEOUT_SECS";
const ENV_DEBUG: &str = "TABLETOP_RELAY_DEBUG";

/// Main relay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Verbose logging regardless of `log_level`.
    #[serde(default)]
    pub debug_mode: bool,
    /// Broadcast channel shared by all peers of a session.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Deadline for calls forwarded to the GM, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Chat channel ID stamped on outgoing notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_channel: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            debug_mode: false,
            channel: default_channel(),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            notification_channel: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Deadline for forwarded calls.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Level handed to the logging layer.
    pub fn effective_log_level(&self) -> &str {
        if self.debug_mode {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// Reject values the router cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.channel.trim().is_empty() {
            return Err(CoreError::Config("channel must not be empty".to_string()));
        }
        if self.call_timeout_secs == 0 {
            return Err(CoreError::Config(
                "call_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(channel) = lookup(ENV_CHANNEL) {
            self.channel = channel;
        }
        if let Some(secs) = lookup(ENV_CALL_TIMEOUT_SECS).and_then(|s| s.parse().ok()) {
            self.call_timeout_secs = secs;
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug_mode = matches!(debug.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
