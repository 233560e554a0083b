//! Conversion from config file sections to runtime configuration.

use std::net::SocketAddr;

use anyhow::{Context as _, Result};

use scriptbox_config::{ExecutionSection, SandboxSection, ServerSection};
use scriptbox_exec::ExecutorConfig;
use scriptbox_sandbox::{ResourceLimits, SandboxConfig};
use scriptbox_server::ServerConfig;

pub fn sandbox_config(section: &SandboxSection) -> SandboxConfig {
    let limits = ResourceLimits {
        time_limit: section.time_limit(),
        supervisor_slack: section.supervisor_slack(),
        max_cpus: section.max_cpus,
        address_space_mb: section.address_space_mb,
        core_size_mb: section.core_size_mb,
        cpu_seconds: section.cpu_seconds,
        file_size_mb: section.file_size_mb,
        max_open_files: section.max_open_files,
    };

    let mut config = SandboxConfig::new()
        .with_interpreter(&section.interpreter)
        .with_isolation_tool(&section.isolation_tool)
        .with_library_paths(section.library_paths.clone())
        .with_limits(limits)
        .with_fallback(section.allow_fallback)
        .with_fallback_pythonpath(section.fallback_pythonpath().map(str::to_string))
        .with_scratch_home(&section.scratch_home);
    config.fallback_path = section.fallback_path.clone();
    if let Some(ref dir) = section.temp_dir {
        config = config.with_temp_dir(dir);
    }
    config
}

pub fn executor_config(section: &ExecutionSection) -> ExecutorConfig {
    ExecutorConfig::default().with_max_concurrent(section.max_concurrent)
}

/// Build the server config, letting CLI flags override the file.
pub fn server_config(
    section: &ServerSection,
    port: Option<u16>,
    bind: Option<&str>,
) -> Result<ServerConfig> {
    let bind = bind.unwrap_or(&section.bind);
    let port = port.unwrap_or(section.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("invalid bind address '{}:{}'", bind, port))?;

    Ok(ServerConfig::new()
        .with_bind_address(addr)
        .with_request_logging(section.request_logging)
        .with_max_body_size(section.max_body_bytes))
}
