//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, GatewayConfig, etc.)
//! - types/sandbox.rs: Sandbox root and shell configuration
//! - io.rs: Configuration loading and env overrides
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{AuthConfig, Config, GatewayConfig, LogConfig, LogFormat};

// Re-export sandbox types
pub use types::sandbox::{SandboxConfig, ShellConfig};

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
