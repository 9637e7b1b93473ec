//! Configuration types module
//!
//! The top-level `Config` plus the gateway, auth and logging sections.
//! Sandbox and shell settings live in `sandbox.rs`.

pub mod sandbox;

use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
///
/// Built once during bootstrap and shared read-only for the process lifetime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Caller authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Sandbox root configuration
    #[serde(default)]
    pub sandbox: sandbox::SandboxConfig,

    /// Shell action configuration
    #[serde(default)]
    pub shell: sandbox::ShellConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Flat `SECRET_TOKEN` key used by older config files
    #[serde(rename = "SECRET_TOKEN", default)]
    pub(crate) legacy_secret_token: Option<SecretString>,

    /// Flat `PORT` key used by older config files
    #[serde(rename = "PORT", default)]
    pub(crate) legacy_port: Option<u16>,

    /// Flat `BASE_DIR` key used by older config files
    #[serde(rename = "BASE_DIR", default)]
    pub(crate) legacy_base_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the discovered config file and environment
    ///
    /// Precedence (lowest first):
    /// 1. Default values
    /// 2. Config file (if present)
    /// 3. Environment variable overrides
    pub fn load(explicit_path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        crate::config::load_config(explicit_path)
    }

    /// Fold the flat legacy keys into their structured counterparts.
    ///
    /// Structured keys win when both forms are present.
    pub(crate) fn fold_legacy_keys(&mut self) {
        if let Some(token) = self.legacy_secret_token.take() {
            if self.auth.secret_token.is_none() {
                self.auth.secret_token = Some(token);
            }
        }
        if let Some(port) = self.legacy_port.take() {
            if self.gateway.port.is_none() {
                self.gateway.port = Some(port);
            }
        }
        if let Some(dir) = self.legacy_base_dir.take() {
            if self.sandbox.base_dir.is_none() {
                self.sandbox.base_dir = Some(dir);
            }
        }
    }
}

/// Gateway (HTTP listener) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Port to bind to, 3000 when unset
    #[serde(default)]
    pub port: Option<u16>,
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            port: None,
            bind: default_bind(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl GatewayConfig {
    /// The effective listening port
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

const DEFAULT_PORT: u16 = 3000;

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024 // 50MB
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared secret every request must carry in its `token` parameter
    #[serde(default)]
    pub secret_token: Option<SecretString>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info,remote_executor=debug".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid log format: {}. Valid: pretty, json",
                s
            ))),
        }
    }
}
