//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]       # HTTP listener
//! [sandbox]      # interpreter, isolation tool, limits
//! [execution]    # pipeline concurrency
//! [logging]      # log file output
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptboxConfig {
    /// HTTP server configuration.
    pub server: Option<ServerSection>,

    /// Sandbox runner configuration.
    pub sandbox: Option<SandboxSection>,

    /// Execution pipeline configuration.
    pub execution: Option<ExecutionSection>,

    /// Log output configuration.
    pub logging: Option<LoggingSection>,
}

impl ScriptboxConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged field by field.
    pub fn merge(&mut self, other: ScriptboxConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.sandbox.is_some() {
            self.sandbox = other.sandbox;
        }

        if other.execution.is_some() {
            self.execution = other.execution;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// Sandbox section, or defaults.
    pub fn sandbox(&self) -> SandboxSection {
        self.sandbox.clone().unwrap_or_default()
    }

    /// Execution section, or defaults.
    pub fn execution(&self) -> ExecutionSection {
        self.execution.clone().unwrap_or_default()
    }

    /// Logging section, or defaults.
    pub fn logging(&self) -> LoggingSection {
        self.logging.clone().unwrap_or_default()
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(ref server) = self.server
            && server.max_body_bytes == 0
        {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if let Some(ref sandbox) = self.sandbox {
            if sandbox.time_limit_secs == 0 {
                return Err(ConfigError::invalid(
                    "sandbox.time_limit_secs",
                    "must be greater than zero",
                ));
            }
            if sandbox.max_cpus == 0 {
                return Err(ConfigError::invalid(
                    "sandbox.max_cpus",
                    "must be greater than zero",
                ));
            }
        }

        if let Some(ref execution) = self.execution
            && execution.max_concurrent == 0
        {
            return Err(ConfigError::invalid(
                "execution.max_concurrent",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: defaults::DEFAULT_PORT,
            bind: defaults::DEFAULT_BIND.to_string(),
            request_logging: true,
            max_body_bytes: defaults::MAX_BODY_BYTES,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sandbox Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Sandbox runner configuration.
///
/// ```toml
/// [sandbox]
/// interpreter = "/usr/bin/python3"
/// isolation_tool = "/usr/local/bin/nsjail"
/// allow_fallback = false
/// time_limit_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    /// Python interpreter, mounted read-only inside the jail.
    pub interpreter: PathBuf,
    /// Isolation tool binary name or path.
    pub isolation_tool: PathBuf,
    /// Library directories mounted read-only inside the jail.
    pub library_paths: Vec<PathBuf>,
    /// Run unsandboxed when the isolation tool cannot be used.
    pub allow_fallback: bool,

    /// Wall-clock limit for one script.
    pub time_limit_secs: u64,
    /// Extra time granted to the isolation tool before it is killed.
    pub supervisor_slack_secs: u64,
    pub max_cpus: u32,
    pub address_space_mb: u64,
    pub core_size_mb: u64,
    pub cpu_seconds: u64,
    pub file_size_mb: u64,
    pub max_open_files: u64,

    /// `PATH` for unsandboxed runs.
    pub fallback_path: String,
    /// `PYTHONPATH` for unsandboxed runs; empty to leave it unset.
    pub fallback_pythonpath: String,
    /// `HOME` and working directory for unsandboxed runs.
    pub scratch_home: PathBuf,
    /// Directory for temporary script files (system default when unset).
    pub temp_dir: Option<PathBuf>,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(defaults::INTERPRETER),
            isolation_tool: PathBuf::from(defaults::ISOLATION_TOOL),
            library_paths: defaults::LIBRARY_PATHS.iter().map(PathBuf::from).collect(),
            allow_fallback: true,
            time_limit_secs: defaults::TIME_LIMIT_SECS,
            supervisor_slack_secs: defaults::SUPERVISOR_SLACK_SECS,
            max_cpus: defaults::MAX_CPUS,
            address_space_mb: defaults::ADDRESS_SPACE_MB,
            core_size_mb: defaults::CORE_SIZE_MB,
            cpu_seconds: defaults::CPU_SECONDS,
            file_size_mb: defaults::FILE_SIZE_MB,
            max_open_files: defaults::MAX_OPEN_FILES,
            fallback_path: defaults::FALLBACK_PATH.to_string(),
            fallback_pythonpath: defaults::FALLBACK_PYTHONPATH.to_string(),
            scratch_home: PathBuf::from(defaults::SCRATCH_HOME),
            temp_dir: None,
        }
    }
}

impl SandboxSection {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    pub fn supervisor_slack(&self) -> Duration {
        Duration::from_secs(self.supervisor_slack_secs)
    }

    /// `PYTHONPATH` for unsandboxed runs, if any.
    pub fn fallback_pythonpath(&self) -> Option<&str> {
        Some(self.fallback_pythonpath.as_str()).filter(|p| !p.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Execution pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Scripts allowed to run at once.
    pub max_concurrent: usize,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::MAX_CONCURRENT,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Write a daily-rotated JSON log file.
    pub file: bool,
    /// Directory for log files (config dir's `logs/` when unset).
    pub dir: Option<PathBuf>,
    /// Default filter directive when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: true,
            dir: None,
            filter: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = ScriptboxConfig::new();
        assert!(config.server.is_none());
        assert!(config.sandbox.is_none());
        assert!(config.execution.is_none());
        assert!(config.logging.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_defaults() {
        let config = ScriptboxConfig::new();

        let server = config.server();
        assert_eq!(server.port, 8080);
        assert_eq!(server.bind, "127.0.0.1");
        assert_eq!(server.max_body_bytes, 1024 * 1024);

        let sandbox = config.sandbox();
        assert_eq!(sandbox.interpreter, PathBuf::from("/usr/local/bin/python3"));
        assert_eq!(sandbox.isolation_tool, PathBuf::from("nsjail"));
        assert_eq!(sandbox.time_limit(), Duration::from_secs(30));
        assert_eq!(sandbox.address_space_mb, 512);
        assert_eq!(sandbox.max_open_files, 64);
        assert!(sandbox.allow_fallback);

        assert_eq!(config.execution().max_concurrent, 4);
        assert!(config.logging().file);
    }

    #[test]
    fn test_parse_partial_section() {
        let toml = r#"
[sandbox]
interpreter = "/usr/bin/python3"
time_limit_secs = 5
"#;
        let config = ScriptboxConfig::from_toml(toml).unwrap();
        let sandbox = config.sandbox.as_ref().unwrap();
        assert_eq!(sandbox.interpreter, PathBuf::from("/usr/bin/python3"));
        assert_eq!(sandbox.time_limit_secs, 5);
        // Unspecified fields keep their defaults
        assert_eq!(sandbox.file_size_mb, 10);
        assert_eq!(sandbox.fallback_path, "/usr/local/bin:/usr/bin:/bin");
        assert!(config.server.is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml = r#"
[server]
port = 9000
bind = "0.0.0.0"
request_logging = false
max_body_bytes = 2048

[sandbox]
isolation_tool = "/opt/nsjail/bin/nsjail"
library_paths = ["/usr/lib"]
allow_fallback = false
max_cpus = 2
temp_dir = "/var/tmp/scriptbox"

[execution]
max_concurrent = 16

[logging]
file = false
filter = "scriptbox=debug"
"#;
        let config = ScriptboxConfig::from_toml(toml).unwrap();

        let server = config.server();
        assert_eq!(server.port, 9000);
        assert_eq!(server.bind, "0.0.0.0");
        assert!(!server.request_logging);
        assert_eq!(server.max_body_bytes, 2048);

        let sandbox = config.sandbox();
        assert_eq!(sandbox.library_paths, vec![PathBuf::from("/usr/lib")]);
        assert!(!sandbox.allow_fallback);
        assert_eq!(sandbox.max_cpus, 2);
        assert_eq!(sandbox.temp_dir, Some(PathBuf::from("/var/tmp/scriptbox")));

        assert_eq!(config.execution().max_concurrent, 16);
        assert!(!config.logging().file);
        assert_eq!(config.logging().filter.as_deref(), Some("scriptbox=debug"));
    }

    #[test]
    fn test_unknown_field_type_is_error() {
        let toml = r#"
[server]
port = "not a number"
"#;
        assert!(matches!(
            ScriptboxConfig::from_toml(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_merge_replaces_sections() {
        let mut base = ScriptboxConfig::from_toml(
            r#"
[server]
port = 8000

[execution]
max_concurrent = 2
"#,
        )
        .unwrap();
        let overlay = ScriptboxConfig::from_toml(
            r#"
[server]
bind = "0.0.0.0"
"#,
        )
        .unwrap();

        base.merge(overlay);

        // Whole section replaced: port is back to the default
        assert_eq!(base.server().bind, "0.0.0.0");
        assert_eq!(base.server().port, 8080);
        // Untouched section preserved
        assert_eq!(base.execution().max_concurrent, 2);
    }

    #[test]
    fn test_empty_pythonpath_means_unset() {
        let mut sandbox = SandboxSection::default();
        assert_eq!(
            sandbox.fallback_pythonpath(),
            Some("/usr/local/lib/python3.11/site-packages")
        );

        sandbox.fallback_pythonpath = String::new();
        assert_eq!(sandbox.fallback_pythonpath(), None);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = ScriptboxConfig::from_toml("[sandbox]\ntime_limit_secs = 0\n").unwrap();
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "sandbox.time_limit_secs"),
            other => panic!("expected Invalid, got {:?}", other),
        }

        let config = ScriptboxConfig::from_toml("[execution]\nmax_concurrent = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = ScriptboxConfig::from_toml("[server]\nmax_body_bytes = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
