//! Configuration system for scriptbox.
//!
//! Provides TOML-based configuration with:
//! - `[server]`: HTTP listener and request handling
//! - `[sandbox]`: interpreter, isolation tool, resource limits, fallback policy
//! - `[execution]`: pipeline concurrency
//! - `[logging]`: log file output
//!
//! Config files are layered (user config, then project-local `scriptbox.toml`);
//! every section is optional and falls back to built-in defaults.

pub mod defaults;
pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    log_dir, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
