//! # Remote Executor
//!
//! A single-process HTTP gateway exposing a sandboxed filesystem and shell
//! to a trusted caller.
//!
//! ## Features
//!
//! - **Shared-secret auth:** every request carries a token compared in constant time
//! - **Sandboxed paths:** caller paths can only resolve inside one root directory
//! - **Four actions:** `write_file`, `read_file`, `list_dir`, `shell`
//! - **GET or POST:** query string, JSON, form-encoded or plain-text bodies

pub mod config;
pub mod error;
pub mod gateway;
pub mod sandbox;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
