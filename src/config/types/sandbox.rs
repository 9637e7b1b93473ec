//! Sandbox configuration types
//!
//! Configuration for the sandbox root and the shell action.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Sandbox configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SandboxConfig {
    /// Directory every file operation is confined to.
    ///
    /// Relative paths are resolved against the config file's directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

/// Shell action configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Whether the `shell` action is served at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Shell program used to interpret command strings
    #[serde(default = "default_program")]
    pub program: String,
    /// Optional wall-clock limit per command (unbounded when absent)
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            enabled: true,
            program: default_program(),
            timeout: None,
        }
    }
}

impl ShellConfig {
    /// Argument that makes `program` run the next argument as a command string
    pub fn command_flag(&self) -> &'static str {
        let name = std::path::Path::new(&self.program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match name.as_str() {
            "cmd" => "/C",
            "powershell" | "pwsh" => "-Command",
            _ => "-c",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_program() -> String {
    if cfg!(windows) {
        "cmd".to_string()
    } else {
        "sh".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_config_default() {
        let config = ShellConfig::default();
        assert!(config.enabled);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_command_flag() {
        let mut config = ShellConfig::default();
        config.program = "/bin/bash".to_string();
        assert_eq!(config.command_flag(), "-c");
        config.program = "cmd".to_string();
        assert_eq!(config.command_flag(), "/C");
        config.program = "pwsh".to_string();
        assert_eq!(config.command_flag(), "-Command");
    }

    #[test]
    fn test_timeout_parses_humantime() {
        let config: ShellConfig =
            serde_json::from_str(r#"{ "timeout": "30s", "enabled": false }"#).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(!config.enabled);
        assert_eq!(config.program, default_program());
    }
}
