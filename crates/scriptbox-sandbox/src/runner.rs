//! Script runner: isolated attempt first, unsandboxed fallback second.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::SandboxConfig;
use crate::error::{SandboxError, SandboxResult};
use crate::outcome::{ExecutionMode, ExecutionOutcome};
use crate::platform::IsolationStatus;

/// A script to run, plus the markers that prove it ran to completion.
///
/// The isolated attempt is accepted when the tool exits zero or when stdout
/// contains one of the completion markers. A rejected attempt only falls
/// back when the tool itself failed to set up the jail.
#[derive(Debug, Clone)]
pub struct ScriptJob {
    /// Full script source.
    pub source: String,
    /// Substrings whose presence on stdout means the script itself finished.
    pub completion_markers: Vec<String>,
}

impl ScriptJob {
    /// Create a job with no completion markers.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            completion_markers: Vec::new(),
        }
    }

    /// Add a completion marker.
    pub fn with_completion_marker(mut self, marker: impl Into<String>) -> Self {
        self.completion_markers.push(marker.into());
        self
    }

    /// Whether `stdout` carries evidence that the script ran to completion.
    pub fn is_complete(&self, stdout: &str) -> bool {
        self.completion_markers
            .iter()
            .any(|marker| stdout.contains(marker.as_str()))
    }

    fn accepts(&self, outcome: &ExecutionOutcome) -> bool {
        outcome.exit_code == 0 || self.is_complete(&outcome.stdout)
    }
}

/// Result of the isolated attempt.
enum IsolatedAttempt {
    /// The script ran (or used up its time); report this outcome.
    Done(ExecutionOutcome),
    /// The isolation tool could not run the script.
    Unusable(String),
}

/// Runs scripts through the isolation tool, falling back to a plain process.
///
/// Every call to [`run`](Self::run) writes the script to its own temporary
/// file, which is removed before the call returns.
pub struct SandboxRunner {
    config: SandboxConfig,
    isolation: IsolationStatus,
}

impl SandboxRunner {
    /// Create a runner, detecting the isolation tool once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable.
    pub fn new(config: SandboxConfig) -> SandboxResult<Self> {
        Self::validate_config(&config)?;

        let isolation = Self::check_availability(&config.isolation_tool);
        if !isolation.is_available() {
            if config.allow_fallback {
                warn!(
                    tool = %config.isolation_tool.display(),
                    "Isolation tool unavailable; scripts will run without resource isolation"
                );
            } else {
                warn!(
                    tool = %config.isolation_tool.display(),
                    "Isolation tool unavailable and fallback disabled; every execution will fail"
                );
            }
        }

        Ok(Self { config, isolation })
    }

    /// Check whether the given isolation tool can be used.
    pub fn check_availability(tool: &Path) -> IsolationStatus {
        IsolationStatus::detect(tool)
    }

    /// Isolation status detected at construction.
    pub fn isolation(&self) -> &IsolationStatus {
        &self.isolation
    }

    /// Get the runner configuration.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Validate a configuration without running anything.
    pub fn validate_config(config: &SandboxConfig) -> SandboxResult<()> {
        if config.limits.time_limit.is_zero() {
            return Err(SandboxError::ConfigError(
                "time limit must be greater than zero".to_string(),
            ));
        }

        if config.limits.max_cpus == 0 {
            return Err(SandboxError::ConfigError(
                "max_cpus must be at least 1".to_string(),
            ));
        }

        if let Some(ref dir) = config.temp_dir
            && !dir.is_dir()
        {
            return Err(SandboxError::ScratchDirUnusable { path: dir.clone() });
        }

        if config.allow_fallback && !config.scratch_home.is_dir() {
            return Err(SandboxError::ScratchDirUnusable {
                path: config.scratch_home.clone(),
            });
        }

        if !config.interpreter.is_file() {
            warn!(
                interpreter = %config.interpreter.display(),
                "Interpreter not found (executions will fail until it is installed)"
            );
        }

        Ok(())
    }

    /// Run a script to completion or timeout.
    ///
    /// Never fails: invocation problems and timeouts are reported as
    /// synthetic outcomes.
    pub async fn run(&self, job: &ScriptJob) -> ExecutionOutcome {
        let script_file = match self.write_script(&job.source) {
            Ok(file) => file,
            Err(e) => {
                return ExecutionOutcome::failed(
                    self.first_mode(),
                    format!("could not write script file: {e}"),
                );
            }
        };

        let outcome = self.run_file(script_file.path(), job).await;

        let path = script_file.path().to_path_buf();
        if let Err(e) = script_file.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove script file");
        }

        outcome
    }

    fn first_mode(&self) -> ExecutionMode {
        if self.isolation.is_available() {
            ExecutionMode::Isolated
        } else {
            ExecutionMode::UnsandboxedFallback
        }
    }

    fn write_script(&self, source: &str) -> SandboxResult<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("scriptbox-").suffix(".py");

        let mut file = match self.config.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(source.as_bytes())?;
        file.flush()?;

        debug!(path = %file.path().display(), bytes = source.len(), "Wrote script file");
        Ok(file)
    }

    async fn run_file(&self, script_path: &Path, job: &ScriptJob) -> ExecutionOutcome {
        if self.isolation.is_available() {
            match self.run_isolated(script_path, job).await {
                IsolatedAttempt::Done(outcome) => return outcome,
                IsolatedAttempt::Unusable(reason) => {
                    if self.config.allow_fallback {
                        warn!(
                            reason = %reason,
                            "Isolated execution failed; falling back to unsandboxed execution"
                        );
                    } else {
                        return ExecutionOutcome::failed(ExecutionMode::Isolated, reason);
                    }
                }
            }
        } else if !self.config.allow_fallback {
            return ExecutionOutcome::failed(
                ExecutionMode::Isolated,
                "isolation tool unavailable and unsandboxed fallback is disabled",
            );
        }

        self.run_fallback(script_path).await
    }

    async fn run_isolated(&self, script_path: &Path, job: &ScriptJob) -> IsolatedAttempt {
        let limits = &self.config.limits;

        let mut cmd = Command::new(&self.config.isolation_tool);
        cmd.args(self.isolation_args(script_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            tool = %self.config.isolation_tool.display(),
            script = %script_path.display(),
            "Starting isolated execution"
        );

        let started = Instant::now();
        match timeout(limits.supervising_timeout(), cmd.output()).await {
            Ok(Ok(output)) => {
                let outcome = ExecutionOutcome::from_output(ExecutionMode::Isolated, &output);
                if job.accepts(&outcome) {
                    IsolatedAttempt::Done(outcome)
                } else if started.elapsed() >= limits.time_limit {
                    debug!(
                        exit_code = outcome.exit_code,
                        "Isolation tool stopped the script at its time limit"
                    );
                    IsolatedAttempt::Done(ExecutionOutcome::timed_out(ExecutionMode::Isolated))
                } else if is_setup_failure(&outcome) {
                    IsolatedAttempt::Unusable(format!(
                        "isolation tool exited with code {}: {}",
                        outcome.exit_code,
                        last_line(&outcome.stderr)
                    ))
                } else {
                    IsolatedAttempt::Done(outcome)
                }
            }
            Ok(Err(e)) => IsolatedAttempt::Unusable(format!(
                "failed to launch {}: {e}",
                self.config.isolation_tool.display()
            )),
            Err(_) => {
                warn!(
                    timeout = ?limits.supervising_timeout(),
                    "Isolation tool exceeded its supervising timeout"
                );
                IsolatedAttempt::Done(ExecutionOutcome::timed_out(ExecutionMode::Isolated))
            }
        }
    }

    async fn run_fallback(&self, script_path: &Path) -> ExecutionOutcome {
        let limit = self.config.limits.time_limit;

        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(script_path)
            .env_clear()
            .envs(self.config.fallback_env())
            .current_dir(&self.config.scratch_home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            interpreter = %self.config.interpreter.display(),
            script = %script_path.display(),
            "Starting unsandboxed execution"
        );

        match timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => {
                ExecutionOutcome::from_output(ExecutionMode::UnsandboxedFallback, &output)
            }
            Ok(Err(e)) => ExecutionOutcome::failed(
                ExecutionMode::UnsandboxedFallback,
                format!("{}: {e}", self.config.interpreter.display()),
            ),
            Err(_) => ExecutionOutcome::timed_out(ExecutionMode::UnsandboxedFallback),
        }
    }

    /// Command-line arguments for the isolation tool.
    pub fn isolation_args(&self, script_path: &Path) -> Vec<OsString> {
        let limits = &self.config.limits;
        let mut args: Vec<OsString> = Vec::new();

        let mut flag = |name: &str, value: String| {
            args.push(name.into());
            args.push(value.into());
        };
        flag("--mode", "o".to_string());
        flag("--time_limit", limits.time_limit.as_secs().max(1).to_string());
        flag("--max_cpus", limits.max_cpus.to_string());
        flag("--rlimit_as", limits.address_space_mb.to_string());
        flag("--rlimit_core", limits.core_size_mb.to_string());
        flag("--rlimit_cpu", limits.cpu_seconds.to_string());
        flag("--rlimit_fsize", limits.file_size_mb.to_string());
        flag("--rlimit_nofile", limits.max_open_files.to_string());

        args.push("--quiet".into());
        args.push("--disable_proc".into());

        let mounts = std::iter::once(self.config.interpreter.as_path())
            .chain(
                self.config
                    .library_paths
                    .iter()
                    .map(|p| p.as_path())
                    .filter(|p| p.exists()),
            )
            .chain(std::iter::once(script_path));
        for mount in mounts {
            args.push("--bindmount_ro".into());
            args.push(mount.as_os_str().to_owned());
        }

        args.push("--".into());
        args.push(self.config.interpreter.as_os_str().to_owned());
        args.push(script_path.as_os_str().to_owned());
        args
    }
}

/// Exit code nsjail uses for its own failures.
const TOOL_FAILURE_EXIT_CODE: i32 = 255;

/// Stderr nsjail writes when a bind mount cannot be set up.
const MOUNT_FAILURE_MESSAGE: &str = "Couldn't mount";

/// Whether a rejected isolated run failed inside the tool, before the script ran.
///
/// Any other exit belongs to the script and is reported as-is; it is never
/// retried outside the sandbox.
fn is_setup_failure(outcome: &ExecutionOutcome) -> bool {
    outcome.exit_code == TOOL_FAILURE_EXIT_CODE || outcome.stderr.contains(MOUNT_FAILURE_MESSAGE)
}

fn last_line(text: &str) -> &str {
    text.trim_end().lines().last().unwrap_or("").trim()
}
