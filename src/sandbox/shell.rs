//! Shell command execution
//!
//! Runs caller-supplied command strings through the configured shell with
//! the sandbox root as working directory. Commands are not restricted: they
//! run with the gateway's privileges and may `cd` or use absolute paths.
//! Duration is unbounded unless `shell.timeout` is configured.

use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ShellConfig;
use crate::error::{Error, Result};

/// Captured result of one shell command
///
/// A non-zero exit status is data, not an error: `error` stays `None` and the
/// status is reported through `exit_code`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellOutput {
    /// Standard output (lossy UTF-8)
    pub stdout: String,
    /// Standard error (lossy UTF-8)
    pub stderr: String,
    /// Set when the command could not run to a normal exit
    pub error: Option<String>,
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    /// Wall-clock execution time
    #[serde(skip)]
    pub execution_time: Duration,
}

impl ShellOutput {
    fn timed_out(timeout: Duration, execution_time: Duration) -> Self {
        ShellOutput {
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("Command timed out after {:?}", timeout)),
            exit_code: None,
            execution_time,
        }
    }
}

/// Shell command runner pinned to the sandbox root
#[derive(Debug, Clone)]
pub struct ShellRunner {
    config: ShellConfig,
    working_dir: PathBuf,
}

impl ShellRunner {
    /// Create a new runner
    pub fn new(config: ShellConfig, working_dir: PathBuf) -> Self {
        ShellRunner {
            config,
            working_dir,
        }
    }

    /// Run a command string to completion and capture both streams
    pub async fn run(&self, command: &str) -> Result<ShellOutput> {
        if !self.config.enabled {
            return Err(Error::ActionDisabled("shell".to_string()));
        }

        debug!(
            "Executing shell command in {} ({} bytes)",
            self.working_dir.display(),
            command.len()
        );

        let start = Instant::now();

        let mut cmd = Command::new(&self.config.program);
        cmd.arg(self.config.command_flag())
            .arg(command)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.config.timeout.is_some());

        let child = cmd
            .spawn()
            .map_err(|e| Error::Process(format!("Failed to spawn {}: {}", self.config.program, e)))?;

        let output = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    // child is dropped here, which kills it
                    warn!("Shell command timed out after {:?}", timeout);
                    return Ok(ShellOutput::timed_out(timeout, start.elapsed()));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| wait_error(&self.config.program, e))?;

        let execution_time = start.elapsed();
        let exit_code = output.status.code();
        let error = match exit_code {
            Some(_) => None,
            None => Some("Command terminated by signal".to_string()),
        };

        debug!(
            "Shell command finished in {:?} (exit code: {:?})",
            execution_time, exit_code
        );

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            error,
            exit_code,
            execution_time,
        })
    }
}

fn wait_error(program: &str, e: std::io::Error) -> Error {
    Error::Process(format!("Failed to wait for {}: {}", program, e))
}
