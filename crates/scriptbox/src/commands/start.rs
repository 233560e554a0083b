//! Start command - launches the HTTP server.

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use scriptbox_sandbox::SandboxRunner;
use scriptbox_server::Server;

use super::Context;
use crate::settings;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    ctx.report_sources();

    let config = &ctx.loaded.config;
    let sandbox = settings::sandbox_config(&config.sandbox());
    let isolation = SandboxRunner::check_availability(&sandbox.isolation_tool);
    if isolation.is_available() {
        info!(status = %isolation, "Isolation tool available");
    } else {
        warn!(
            status = %isolation,
            allow_fallback = sandbox.allow_fallback,
            "Isolation tool unavailable"
        );
    }

    let executor = ctx.build_executor()?;
    let server_config =
        settings::server_config(&config.server(), args.port, args.bind.as_deref())?;

    if ctx.verbose {
        eprintln!("Bind address: {}", server_config.bind_address);
        eprintln!("Isolation: {}", isolation);
        eprintln!("Concurrent executions: {}", executor.available_slots());
    }

    Server::new(executor, server_config).run().await?;

    Ok(())
}
