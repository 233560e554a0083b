//! Raw results of running a script.

use std::fmt;
use std::process::Output;

use serde::Serialize;

/// Exit code reported for a script that ran out of time.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Stderr text reported for a script that ran out of time.
pub const TIMEOUT_MESSAGE: &str = "Execution timed out";

/// Which path produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Ran inside the isolation tool with resource limits.
    Isolated,
    /// Ran as a plain child process; only the wall-clock limit applied.
    UnsandboxedFallback,
}

impl ExecutionMode {
    /// Stable name for logs and headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Isolated => "isolated",
            ExecutionMode::UnsandboxedFallback => "unsandboxed_fallback",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output from one script execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (0 = success, -1 = killed by a signal).
    pub exit_code: i32,
    /// Path the script took.
    pub mode: ExecutionMode,
    /// Whether the wall-clock limit was hit.
    pub timed_out: bool,
}

impl ExecutionOutcome {
    /// Create an outcome from captured output.
    pub fn new(mode: ExecutionMode, stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            mode,
            timed_out: false,
        }
    }

    /// Create an outcome from a finished process.
    pub fn from_output(mode: ExecutionMode, output: &Output) -> Self {
        Self::new(
            mode,
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            output.status.code().unwrap_or(-1),
        )
    }

    /// Synthetic outcome for a script that exceeded its time limit.
    pub fn timed_out(mode: ExecutionMode) -> Self {
        Self {
            stdout: String::new(),
            stderr: TIMEOUT_MESSAGE.to_string(),
            exit_code: TIMEOUT_EXIT_CODE,
            mode,
            timed_out: true,
        }
    }

    /// Synthetic outcome for a process that could not be started.
    pub fn failed(mode: ExecutionMode, reason: impl fmt::Display) -> Self {
        Self::new(
            mode,
            String::new(),
            format!("Execution failed: {reason}"),
            1,
        )
    }

    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
