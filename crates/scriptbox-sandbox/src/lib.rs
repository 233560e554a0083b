//! Isolated script execution with an unsandboxed fallback.
//!
//! A [`SandboxRunner`] writes each script to its own temporary file and runs
//! it with the configured interpreter. When the isolation tool (`nsjail`) is
//! available the script runs inside it first; if the tool cannot be used the
//! runner falls back to a plain child process with a cleared environment.
//!
//! # Security Model
//!
//! - **Filesystem**: read-only bind mounts of the interpreter, library
//!   directories and the script file only
//! - **Resources**: CPU, memory, file size and descriptor limits, `/proc` hidden
//! - **Fallback**: wall-clock limit only; reported as
//!   [`ExecutionMode::UnsandboxedFallback`]
//!
//! # Example
//!
//! ```no_run
//! use scriptbox_sandbox::{SandboxConfig, SandboxRunner, ScriptJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = SandboxRunner::new(SandboxConfig::default())?;
//!     if !runner.isolation().is_available() {
//!         eprintln!("{}", runner.isolation());
//!     }
//!
//!     let outcome = runner.run(&ScriptJob::new("print('hello')")).await;
//!     println!("{} ({})", outcome.stdout, outcome.mode);
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod outcome;
mod platform;
mod runner;

pub use config::{DEFAULT_INTERPRETER, DEFAULT_ISOLATION_TOOL, ResourceLimits, SandboxConfig};
pub use error::{SandboxError, SandboxResult};
pub use outcome::{ExecutionMode, ExecutionOutcome, TIMEOUT_EXIT_CODE, TIMEOUT_MESSAGE};
pub use platform::{IsolationStatus, Platform, binary_exists};
pub use runner::{SandboxRunner, ScriptJob};
