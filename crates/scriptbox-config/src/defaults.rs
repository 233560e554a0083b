//! Built-in default values for every config field.

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB

pub const INTERPRETER: &str = "/usr/local/bin/python3";
pub const ISOLATION_TOOL: &str = "nsjail";
pub const LIBRARY_PATHS: &[&str] = &["/usr/lib", "/lib", "/lib64", "/usr/local/lib"];

pub const TIME_LIMIT_SECS: u64 = 30;
/// Extra wall-clock time the supervisor grants the isolation tool.
pub const SUPERVISOR_SLACK_SECS: u64 = 5;
pub const MAX_CPUS: u32 = 1;
pub const ADDRESS_SPACE_MB: u64 = 512;
pub const CORE_SIZE_MB: u64 = 0;
pub const CPU_SECONDS: u64 = 30;
pub const FILE_SIZE_MB: u64 = 10;
pub const MAX_OPEN_FILES: u64 = 64;

pub const FALLBACK_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
pub const FALLBACK_PYTHONPATH: &str = "/usr/local/lib/python3.11/site-packages";
pub const SCRATCH_HOME: &str = "/tmp";

pub const MAX_CONCURRENT: usize = 4;
