//! Sandbox module - Confined file operations and shell execution
//!
//! - resolver: turns caller paths into paths proven to stay in the root
//! - executor: performs one write/read/list/shell action
//! - shell: runs command strings with the root as working directory

mod executor;
mod resolver;
mod shell;

pub use executor::{Action, ActionCall, ActionExecutor, ActionOutcome};
pub use resolver::{SandboxRoot, SandboxedPath};
pub use shell::{ShellOutput, ShellRunner};
