//! Sandbox configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default interpreter binary.
pub const DEFAULT_INTERPRETER: &str = "/usr/local/bin/python3";

/// Default isolation tool, resolved through `PATH`.
pub const DEFAULT_ISOLATION_TOOL: &str = "nsjail";

/// Resource ceilings enforced by the isolation tool.
///
/// Only [`time_limit`](Self::time_limit) also applies to the fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Wall-clock limit for the script.
    pub time_limit: Duration,
    /// Extra time granted to the supervising timeout around the isolation tool.
    pub supervisor_slack: Duration,
    /// Number of logical CPUs.
    pub max_cpus: u32,
    /// Address space limit in MB.
    pub address_space_mb: u64,
    /// Core dump size limit in MB.
    pub core_size_mb: u64,
    /// CPU time limit in seconds.
    pub cpu_seconds: u64,
    /// Largest file the script may write, in MB.
    pub file_size_mb: u64,
    /// Maximum open file descriptors.
    pub max_open_files: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            supervisor_slack: Duration::from_secs(5),
            max_cpus: 1,
            address_space_mb: 512,
            core_size_mb: 0,
            cpu_seconds: 30,
            file_size_mb: 10,
            max_open_files: 64,
        }
    }
}

impl ResourceLimits {
    /// Timeout applied around the isolation tool process.
    pub fn supervising_timeout(&self) -> Duration {
        self.time_limit + self.supervisor_slack
    }
}

/// Configuration for script execution.
///
/// # Security Model
///
/// - **Isolated path**: the isolation tool sees only the interpreter, the
///   library directories and the script file, all mounted read-only.
/// - **Fallback path**: a plain child process with a cleared environment.
///   Only the wall-clock limit applies.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Interpreter binary the script is run with.
    pub interpreter: PathBuf,

    /// Isolation tool binary (bare name is resolved through `PATH`).
    pub isolation_tool: PathBuf,

    /// Directories mounted read-only for the interpreter's shared libraries
    /// and standard library. Missing entries are skipped.
    pub library_paths: Vec<PathBuf>,

    /// Resource ceilings.
    pub limits: ResourceLimits,

    /// Run scripts without isolation when the isolation tool cannot be used.
    pub allow_fallback: bool,

    /// `PATH` for the fallback process.
    pub fallback_path: String,

    /// `PYTHONPATH` for the fallback process, if any.
    pub fallback_pythonpath: Option<String>,

    /// `HOME` and working directory of the fallback process.
    pub scratch_home: PathBuf,

    /// Directory for temporary script files (system default if `None`).
    pub temp_dir: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            isolation_tool: PathBuf::from(DEFAULT_ISOLATION_TOOL),
            library_paths: Self::default_library_paths(),
            limits: ResourceLimits::default(),
            allow_fallback: true,
            fallback_path: "/usr/local/bin:/usr/bin:/bin".to_string(),
            fallback_pythonpath: Some("/usr/local/lib/python3.11/site-packages".to_string()),
            scratch_home: PathBuf::from("/tmp"),
            temp_dir: None,
        }
    }
}

impl SandboxConfig {
    /// Create a new sandbox configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpreter binary.
    pub fn with_interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter = path.into();
        self
    }

    /// Set the isolation tool binary.
    pub fn with_isolation_tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.isolation_tool = path.into();
        self
    }

    /// Set the library directories mounted into the sandbox.
    pub fn with_library_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.library_paths = paths;
        self
    }

    /// Set the resource limits.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set only the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.limits.time_limit = limit;
        self
    }

    /// Allow or forbid the unsandboxed fallback.
    pub fn with_fallback(mut self, allow: bool) -> Self {
        self.allow_fallback = allow;
        self
    }

    /// Set `PYTHONPATH` for the fallback process.
    pub fn with_fallback_pythonpath(mut self, pythonpath: Option<String>) -> Self {
        self.fallback_pythonpath = pythonpath;
        self
    }

    /// Set the fallback process's home and working directory.
    pub fn with_scratch_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_home = dir.into();
        self
    }

    /// Set the directory temporary script files are written to.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Get the default library directories.
    pub fn default_library_paths() -> Vec<PathBuf> {
        ["/usr/lib", "/lib", "/lib64", "/usr/local/lib"]
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }

    /// Environment handed to the fallback process.
    pub fn fallback_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("PATH".to_string(), self.fallback_path.clone()),
            (
                "HOME".to_string(),
                self.scratch_home.to_string_lossy().into_owned(),
            ),
        ];
        if let Some(ref pythonpath) = self.fallback_pythonpath {
            env.push(("PYTHONPATH".to_string(), pythonpath.clone()));
        }
        env
    }
}
