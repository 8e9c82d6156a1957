//! File system paths for the relay.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Hub socket filename under the base runtime directory.
const HUB_SOCKET_NAME: &str = "hub.sock";

/// Manages file system paths for the relay.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.tabletop-relay)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.tabletop-relay`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".tabletop-relay"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.tabletop-relay).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.tabletop-relay/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the broadcast hub socket path (~/.tabletop-relay/hub.sock).
    pub fn hub_socket_file(&self) -> PathBuf {
        self.base_dir.join(HUB_SOCKET_NAME)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_under_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/relay-test"));

        assert_eq!(paths.config_file(), PathBuf::from("/tmp/relay-test/config.json"));
        assert_eq!(paths.hub_socket_file(), PathBuf::from("/tmp/relay-test/hub.sock"));
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested"));

        paths.ensure_dirs().unwrap();
        assert!(paths.base_dir().is_dir());
    }
}
