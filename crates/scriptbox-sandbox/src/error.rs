//! Error types for sandbox operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while setting up sandboxed execution.
///
/// Failures of a single run are never reported through this type: they are
/// folded into an [`ExecutionOutcome`](crate::ExecutionOutcome) instead.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Configuration error.
    #[error("Invalid sandbox configuration: {0}")]
    ConfigError(String),

    /// Scratch directory is missing or not a directory.
    #[error("Scratch directory not usable: {path}")]
    ScratchDirUnusable { path: PathBuf },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
