//! Configuration I/O - Loading configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use secrecy::SecretString;

use super::paths;
use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
///
/// An explicitly requested file that does not exist is an error.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config> {
    // Load .env first so it can also name the config file
    dotenvy::dotenv().ok();

    let config_path = paths::config_path(explicit_path);

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else if explicit_path.is_some() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    } else {
        Config::default()
    };

    // Apply environment variable overrides (highest precedence)
    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Load configuration from a specific path
///
/// Legacy flat keys are folded in and a relative `base_dir` is anchored to
/// the directory containing the file.
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let mut config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // Parse as JSON5 (more lenient than strict JSON)
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    config.fold_legacy_keys();

    if let Some(dir) = config.sandbox.base_dir.take() {
        let anchored = if dir.is_relative() {
            paths::base_for(path).join(dir)
        } else {
            dir
        };
        config.sandbox.base_dir = Some(anchored);
    }

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// This loads `.env` file first and overlays any set environment variables
/// onto the config. Env vars have the highest precedence below CLI flags.
/// A value that does not parse is an error.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary key lookup
pub(crate) fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(*key));

    if let Some(token) = first(&["REMOTE_EXECUTOR_SECRET_TOKEN", "SECRET_TOKEN"]) {
        config.auth.secret_token = Some(SecretString::from(token));
    }
    if let Some(port) = first(&["REMOTE_EXECUTOR_PORT", "PORT"]) {
        let port = port
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid PORT: {}", port)))?;
        config.gateway.port = Some(port);
    }
    if let Some(bind) = first(&["REMOTE_EXECUTOR_BIND"]) {
        config.gateway.bind = bind;
    }
    if let Some(dir) = first(&["REMOTE_EXECUTOR_BASE_DIR", "BASE_DIR"]) {
        config.sandbox.base_dir = Some(std::path::PathBuf::from(dir));
    }
    if let Some(v) = first(&["REMOTE_EXECUTOR_SHELL_ENABLED"]) {
        config.shell.enabled = parse_bool("REMOTE_EXECUTOR_SHELL_ENABLED", &v)?;
    }
    if let Some(program) = first(&["REMOTE_EXECUTOR_SHELL"]) {
        config.shell.program = program;
    }
    if let Some(level) = first(&["RUST_LOG"]) {
        config.log.level = level;
    }
    if let Some(format) = first(&["LOG_FORMAT"]) {
        config.log.format = format
            .parse()
            .map_err(|_| Error::Config(format!("Invalid LOG_FORMAT: {}", format)))?;
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::Config(format!("Invalid {}: {}", key, value))),
    }
}
