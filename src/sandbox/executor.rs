//! Action executor
//!
//! Performs exactly one filesystem or shell operation per call. Path-bearing
//! actions only accept a [`SandboxedPath`], so the resolver has always run
//! before any file is touched.

use tracing::info;

use super::resolver::{SandboxRoot, SandboxedPath};
use super::shell::{ShellOutput, ShellRunner};
use crate::config::ShellConfig;
use crate::error::{Error, Result};

/// Supported actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    WriteFile,
    ReadFile,
    ListDir,
    Shell,
}

impl Action {
    /// Whether the action takes a `path` parameter
    pub fn takes_path(self) -> bool {
        !matches!(self, Action::Shell)
    }
}

impl std::str::FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "write_file" => Ok(Action::WriteFile),
            "read_file" => Ok(Action::ReadFile),
            "list_dir" => Ok(Action::ListDir),
            "shell" => Ok(Action::Shell),
            _ => Err(Error::BadRequest("Invalid action".to_string())),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::WriteFile => write!(f, "write_file"),
            Action::ReadFile => write!(f, "read_file"),
            Action::ListDir => write!(f, "list_dir"),
            Action::Shell => write!(f, "shell"),
        }
    }
}

/// A fully validated action, ready to run
#[derive(Debug, Clone)]
pub enum ActionCall {
    WriteFile { path: SandboxedPath, content: String },
    ReadFile { path: SandboxedPath },
    ListDir { path: SandboxedPath },
    Shell { command: String },
}

impl ActionCall {
    /// The action this call performs
    pub fn action(&self) -> Action {
        match self {
            ActionCall::WriteFile { .. } => Action::WriteFile,
            ActionCall::ReadFile { .. } => Action::ReadFile,
            ActionCall::ListDir { .. } => Action::ListDir,
            ActionCall::Shell { .. } => Action::Shell,
        }
    }
}

/// Successful outcome of an action
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// File written; number of bytes written
    Written { bytes: usize },
    /// Full file content
    Read { content: String },
    /// Immediate directory entry names
    Listed { files: Vec<String> },
    /// Captured shell output, whatever the exit status
    Shell(ShellOutput),
}

/// Executes actions against one sandbox root
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    root: SandboxRoot,
    shell: ShellRunner,
}

impl ActionExecutor {
    /// Create an executor whose shell runs in the sandbox root
    pub fn new(root: SandboxRoot, shell_config: ShellConfig) -> Self {
        let shell = ShellRunner::new(shell_config, root.path().to_path_buf());
        ActionExecutor { root, shell }
    }

    /// The sandbox root
    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    /// Run one action to completion
    pub async fn run(&self, call: ActionCall) -> Result<ActionOutcome> {
        match call {
            ActionCall::WriteFile { path, content } => {
                let bytes = self.write_file(&path, &content).await?;
                Ok(ActionOutcome::Written { bytes })
            }
            ActionCall::ReadFile { path } => {
                let content = self.read_file(&path).await?;
                Ok(ActionOutcome::Read { content })
            }
            ActionCall::ListDir { path } => {
                let files = self.list_dir(&path).await?;
                Ok(ActionOutcome::Listed { files })
            }
            ActionCall::Shell { command } => {
                let output = self.shell.run(&command).await?;
                Ok(ActionOutcome::Shell(output))
            }
        }
    }

    /// Write `content`, creating missing parent directories and overwriting
    /// any existing file
    pub async fn write_file(&self, path: &SandboxedPath, content: &str) -> Result<usize> {
        if let Some(parent) = path.as_path().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;

        info!(path = %path, bytes = content.len(), "File written");
        Ok(content.len())
    }

    /// Read a whole file as UTF-8 text
    pub async fn read_file(&self, path: &SandboxedPath) -> Result<String> {
        let content = tokio::fs::read_to_string(path).await?;

        info!(path = %path, bytes = content.len(), "File read");
        Ok(content)
    }

    /// List the names of a directory's immediate entries, sorted
    pub async fn list_dir(&self, path: &SandboxedPath) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
        files.sort();

        info!(path = %path, entries = files.len(), "Directory listed");
        Ok(files)
    }
}
