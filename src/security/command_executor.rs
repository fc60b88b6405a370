//! SafeCommandExecutor: async registry CLI execution without a shell
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only registry CLIs can execute
//! - **Injection prevention**: Arguments are passed as a vector to
//!   `tokio::process::Command`, never interpolated into a shell string
//! - **Secret masking**: [`CommandArg::Secret`] values are masked whenever a
//!   command is rendered for logs or dry-run output
//! - **Working directory validation**: Validated before execution
//! - **Optional timeout**: Hung commands are killed when a timeout is set
//!
//! # Example
//!
//! ```rust,no_run
//! use release_publisher::security::{CommandArg, SafeCommandExecutor};
//!
//! # async fn example() -> Result<(), release_publisher::security::CommandError> {
//! let executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! let tags = executor
//!     .read("npm", &["info".into(), "react".into(), "dist-tags".into(), "--json".into()])
//!     .await?;
//! println!("{}", tags);
//! # Ok(())
//! # }
//! ```

use crate::security::otp::{OTP_MASK, Otp};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist.
const ALLOWED_COMMANDS: &[&str] = &["npm", "pnpm", "yarn"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (e.g., binary not found)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command ran and exited unsuccessfully
    #[error("`{command}` exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Command exceeded the timeout duration
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// A single command-line argument
#[derive(Debug, Clone)]
pub enum CommandArg {
    Plain(String),
    /// Passed to the process verbatim, masked everywhere else
    Secret(Otp),
}

impl CommandArg {
    fn value(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret(otp) => otp.expose(),
        }
    }

    fn display(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret(_) => OTP_MASK,
        }
    }
}

impl From<&str> for CommandArg {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

/// Captured output of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// False when the command was skipped because of dry-run mode
    pub executed: bool,
}

/// Render a command for display, masking secrets
pub fn render_command(command: &str, args: &[CommandArg]) -> String {
    std::iter::once(command)
        .chain(args.iter().map(CommandArg::display))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Safe command executor with security controls
#[derive(Debug, Clone)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
    /// Skip mutating commands and only print them
    dry_run: bool,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
            dry_run: false,
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are killed.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// In dry-run mode [`execute`](Self::execute) only prints the command.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Execute a command that changes registry state, unless in dry-run mode.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::NonZeroExit` - Command failed
    /// - `CommandError::Timeout` - Timeout elapsed
    pub async fn execute(
        &self,
        command: &str,
        args: &[CommandArg],
    ) -> Result<CommandOutput, CommandError> {
        Self::check_allowed(command)?;

        if self.dry_run {
            let rendered = render_command(command, args);
            println!("  [dry-run] {}", rendered);
            tracing::info!(command = %rendered, cwd = %self.working_dir.display(), "dry run, command skipped");
            return Ok(CommandOutput::default());
        }

        self.run(command, args).await
    }

    /// Execute a read-only command and return its trimmed stdout.
    ///
    /// Runs in dry-run mode too.
    pub async fn read(&self, command: &str, args: &[CommandArg]) -> Result<String, CommandError> {
        Self::check_allowed(command)?;
        let output = self.run(command, args).await?;
        Ok(output.stdout.trim().to_string())
    }

    fn check_allowed(command: &str) -> Result<(), CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }
        Ok(())
    }

    async fn run(&self, command: &str, args: &[CommandArg]) -> Result<CommandOutput, CommandError> {
        // Windows-specific: npm, yarn, etc. are .cmd files, not .exe
        #[cfg(target_os = "windows")]
        let command_name = format!("{}.cmd", command);

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        let rendered = render_command(command, args);
        tracing::info!(command = %rendered, cwd = %self.working_dir.display(), "running");

        let mut cmd = Command::new(&command_name);
        cmd.args(args.iter().map(CommandArg::value))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd.output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child)
                .await
                .map_err(|_| CommandError::Timeout {
                    command: rendered.clone(),
                    timeout,
                })?,
            None => child.await,
        }
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::debug!(command = %rendered, %stdout, %stderr, "finished");

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: rendered,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            executed: true,
        })
    }
}
