//! External command execution.
//!
//! Console handlers never spawn processes directly. They hand an argument
//! vector to a [`CommandExecutor`] and get back the exit status and the
//! captured output.

use log::{debug, warn};
use std::process::{Command, Stdio};

/// Exit status reported when the program could not be started.
pub const SPAWN_FAILED_STATUS: i32 = 127;

/// Exit status reported when the program was killed by a signal.
pub const SIGNALLED_STATUS: i32 = -1;

/// Result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Process exit status.
    pub status: i32,
    /// Captured stdout followed by stderr.
    pub output: String,
}

impl ExecOutput {
    /// Create a new output record.
    pub fn new(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }

    /// Check if the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs external commands on behalf of console handlers.
///
/// Implementations block until the command finishes.
pub trait CommandExecutor: Send + Sync {
    /// Run `argv[0]` with the remaining arguments.
    fn execute(&self, argv: &[String]) -> ExecOutput;
}

/// Executor backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Create a new system executor.
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, argv: &[String]) -> ExecOutput {
        let Some((program, args)) = argv.split_first() else {
            return ExecOutput::new(SPAWN_FAILED_STATUS, "empty command");
        };

        // Arguments may carry a password, so only the program is logged
        debug!("Running {} ({} args)", program, args.len());

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output();

        match result {
            Ok(out) => {
                let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
                output.push_str(&String::from_utf8_lossy(&out.stderr));
                let status = out.status.code().unwrap_or(SIGNALLED_STATUS);
                debug!("{} exited with status {}", program, status);
                ExecOutput { status, output }
            }
            Err(e) => {
                warn!("Failed to run {}: {}", program, e);
                ExecOutput::new(SPAWN_FAILED_STATUS, format!("failed to run {}: {}", program, e))
            }
        }
    }
}
