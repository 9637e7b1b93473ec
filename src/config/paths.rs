//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("REMOTE_EXECUTOR_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("remote-executor"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("remote-executor"))
                .unwrap_or_else(|| PathBuf::from(".remote-executor"))
        })
}

/// Get the main configuration file path
///
/// Lookup order: explicit path, `REMOTE_EXECUTOR_CONFIG`, `./config.json`,
/// then the per-user config directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var("REMOTE_EXECUTOR_CONFIG") {
        return PathBuf::from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }

    config_dir().join(CONFIG_FILE_NAME)
}

/// Directory relative config values are resolved against
pub fn base_for(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = config_path(Some(Path::new("/etc/remote-executor.toml")));
        assert_eq!(path, PathBuf::from("/etc/remote-executor.toml"));
    }

    #[test]
    fn test_base_for() {
        assert_eq!(
            base_for(Path::new("/srv/gateway/config.json")),
            PathBuf::from("/srv/gateway")
        );
        assert_eq!(base_for(Path::new("config.json")), PathBuf::from("."));
    }
}
