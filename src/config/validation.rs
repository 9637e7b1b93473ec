//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_auth_config(config, result);
    result = validate_gateway_config(config, result);
    result = validate_sandbox_config(config, result);
    result = validate_shell_config(config, result);

    result
}

fn validate_auth_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let has_token = config
        .auth
        .secret_token
        .as_ref()
        .is_some_and(|token| !token.expose_secret().is_empty());

    if !has_token {
        result = result.with_error(
            ValidationIssue::new("auth.secret_token", "SECRET_TOKEN must be set")
                .with_suggestion("Set SECRET_TOKEN in config.json or REMOTE_EXECUTOR_SECRET_TOKEN"),
        );
    }

    result
}

fn validate_gateway_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.gateway.port() == 0 {
        result = result.with_error(
            ValidationIssue::new("gateway.port", "Port must be non-zero")
                .with_suggestion("Set PORT in config.json or pass --port"),
        );
    }

    if config.gateway.bind != "127.0.0.1" && config.gateway.bind != "localhost" {
        result = result.with_warning(ValidationIssue::new(
            "gateway.bind",
            format!(
                "Listening on {} exposes file and shell access beyond localhost",
                config.gateway.bind
            ),
        ));
    }

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match &config.sandbox.base_dir {
        None => {
            result = result.with_error(
                ValidationIssue::new("sandbox.base_dir", "BASE_DIR must be set")
                    .with_suggestion("Set BASE_DIR in config.json or REMOTE_EXECUTOR_BASE_DIR"),
            );
        }
        Some(dir) if dir.as_os_str().is_empty() => {
            result = result.with_error(ValidationIssue::new(
                "sandbox.base_dir",
                "BASE_DIR must not be empty",
            ));
        }
        Some(dir) if dir.exists() && !dir.is_dir() => {
            result = result.with_error(ValidationIssue::new(
                "sandbox.base_dir",
                format!("{} exists but is not a directory", dir.display()),
            ));
        }
        Some(_) => {}
    }

    result
}

fn validate_shell_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if !config.shell.enabled {
        result = result.with_warning(ValidationIssue::new(
            "shell.enabled",
            "Shell action is disabled; shell requests will fail",
        ));
    } else if which::which(&config.shell.program).is_err() {
        result = result.with_warning(
            ValidationIssue::new(
                "shell.program",
                format!("Shell program not found on PATH: {}", config.shell.program),
            )
            .with_suggestion("Set shell.program to an installed shell"),
        );
    }

    result
}
