//! Error types for the execution pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ExecError>;

/// A submission rejected before anything was run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only script.
    #[error("Script cannot be empty")]
    Empty,

    /// Script longer than the character limit.
    #[error("Script too large ({len} characters, max {max})")]
    TooLarge { len: usize, max: usize },

    /// No top-level `main` definition.
    #[error("Script must contain a main() function")]
    MissingEntryPoint,

    /// `main` has required parameters.
    #[error("main() must be callable without arguments")]
    EntryPointTakesArguments,
}

/// Errors produced by [`Executor::execute`](crate::Executor::execute).
#[derive(Debug, Error)]
pub enum ExecError {
    /// The submission failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The script raised, crashed, or produced no decodable frame.
    #[error("Script execution error: {0}")]
    Execution(String),

    /// The script exceeded its time limit.
    #[error("Script execution error: execution timed out")]
    Timeout,

    /// The result could not be encoded or decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Coarse failure class, used by the boundary layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Client-attributable.
    Validation,
    /// Server-side execution failure.
    Execution,
    /// Server-side encoding failure.
    Decode,
}

impl FailureKind {
    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation_error",
            FailureKind::Execution => "execution_error",
            FailureKind::Decode => "decode_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ExecError {
    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ExecError::Validation(_) => FailureKind::Validation,
            ExecError::Execution(_) | ExecError::Timeout => FailureKind::Execution,
            ExecError::Decode(_) => FailureKind::Decode,
        }
    }

    /// Whether the error was caused by the submission itself.
    pub fn is_client_error(&self) -> bool {
        self.kind() == FailureKind::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ExecError::from(ValidationError::Empty).kind(),
            FailureKind::Validation
        );
        assert_eq!(
            ExecError::Execution("boom".to_string()).kind(),
            FailureKind::Execution
        );
        assert_eq!(ExecError::Timeout.kind(), FailureKind::Execution);
        assert_eq!(
            ExecError::Decode("bad".to_string()).kind(),
            FailureKind::Decode
        );
        assert!(ExecError::from(ValidationError::MissingEntryPoint).is_client_error());
        assert!(!ExecError::Timeout.is_client_error());
    }

    #[test]
    fn test_error_messages() {
        let err = ExecError::from(ValidationError::TooLarge {
            len: 50_001,
            max: 50_000,
        });
        assert_eq!(
            err.to_string(),
            "Validation error: Script too large (50001 characters, max 50000)"
        );

        let err = ExecError::Execution("Test error".to_string());
        assert_eq!(err.to_string(), "Script execution error: Test error");
        assert!(ExecError::Timeout.to_string().contains("timed out"));
    }
}
