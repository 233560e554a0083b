//! Execution pipeline for untrusted Python scripts.
//!
//! A submission goes through four stages:
//!
//! 1. **Validate**: non-empty, at most [`MAX_SCRIPT_CHARS`] characters, and a
//!    top-level `main()` callable without arguments
//! 2. **Harness**: append an epilogue that calls `main()`, captures what it
//!    prints and writes a single framed JSON result to stdout
//! 3. **Run**: hand the harnessed script to a [`ScriptRunner`], normally a
//!    [`scriptbox_sandbox::SandboxRunner`]
//! 4. **Decode**: pull the last frame carrying this execution's nonce out of
//!    stdout and turn it into an [`ExecutionResult`] or an [`ExecError`]
//!
//! [`Executor`] ties the stages together and caps how many scripts run at
//! once.

mod decode;
mod error;
mod executor;
mod harness;
mod protocol;
mod validate;

pub use decode::{ExecutionResult, decode};
pub use error::{ExecError, FailureKind, Result, ValidationError};
pub use executor::{DEFAULT_MAX_CONCURRENT, Executor, ExecutorConfig, ScriptRunner};
pub use harness::{HarnessBuilder, HarnessedScript};
pub use protocol::{ErrorFrame, ErrorFrameKind, FrameMarkers, RawFrame, SuccessFrame};
pub use validate::{ENTRY_POINT, MAX_SCRIPT_CHARS, validate};

pub use scriptbox_sandbox::ExecutionMode;
