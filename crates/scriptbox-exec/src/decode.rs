//! Turns a raw execution outcome into a result or a typed failure.

use serde::Serialize;
use serde_json::Value;

use scriptbox_sandbox::{ExecutionMode, ExecutionOutcome};

use crate::error::{ExecError, Result};
use crate::protocol::{ErrorFrame, ErrorFrameKind, FrameMarkers, RawFrame, SuccessFrame};

/// Value returned by `main()` plus what it printed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Return value of `main()`.
    pub result: Value,
    /// Output printed while `main()` ran.
    pub stdout: String,
    /// Path the script took.
    pub mode: ExecutionMode,
}

/// Decode an outcome produced by a script harnessed with `markers`.
///
/// An error frame is honoured whatever the exit code; a success frame only
/// with exit code zero.
pub fn decode(outcome: &ExecutionOutcome, markers: &FrameMarkers) -> Result<ExecutionResult> {
    if outcome.timed_out {
        return Err(ExecError::Timeout);
    }

    match markers.last_frame(&outcome.stdout) {
        Some(RawFrame::Error(body)) => Err(error_from_frame(body)),
        Some(RawFrame::Success(body)) if outcome.success() => {
            let frame: SuccessFrame = serde_json::from_str(body)
                .map_err(|e| ExecError::Decode(format!("malformed result payload: {e}")))?;
            Ok(ExecutionResult {
                result: frame.main_result,
                stdout: frame.stdout,
                mode: outcome.mode,
            })
        }
        _ if !outcome.success() => Err(ExecError::Execution(failure_message(outcome))),
        _ => Err(ExecError::Execution(
            "could not extract result from script output".to_string(),
        )),
    }
}

fn error_from_frame(body: &str) -> ExecError {
    match serde_json::from_str::<ErrorFrame>(body) {
        Ok(ErrorFrame {
            kind: ErrorFrameKind::Unserializable,
            message,
        }) => ExecError::Decode(message),
        Ok(frame) => ExecError::Execution(frame.message),
        Err(_) => ExecError::Execution(body.trim().to_string()),
    }
}

fn failure_message(outcome: &ExecutionOutcome) -> String {
    let stderr = outcome.stderr.trim();
    if stderr.is_empty() {
        format!("script exited with code {}", outcome.exit_code)
    } else {
        stderr.to_string()
    }
}
