//! Check command - reports what the runner can use on this host.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use scriptbox_sandbox::{SandboxRunner, binary_exists};

use super::Context;
use crate::settings;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Run the check command.
pub async fn run(_args: CheckArgs, ctx: &Context) -> Result<()> {
    ctx.report_sources();

    let sandbox = settings::sandbox_config(&ctx.loaded.config.sandbox());
    let isolation = SandboxRunner::check_availability(&sandbox.isolation_tool);
    let interpreter_found = binary_exists(&sandbox.interpreter);
    let config_files: Vec<String> = ctx
        .loaded
        .loaded_from()
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if ctx.json_output {
        let output = json!({
            "isolation": {
                "tool": sandbox.isolation_tool.display().to_string(),
                "available": isolation.is_available(),
                "status": isolation.to_string(),
                "install_hint": isolation.install_hint(),
            },
            "interpreter": {
                "path": sandbox.interpreter.display().to_string(),
                "found": interpreter_found,
            },
            "allow_fallback": sandbox.allow_fallback,
            "config_files": config_files,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", isolation);
    println!(
        "Interpreter: {} ({})",
        sandbox.interpreter.display(),
        if interpreter_found { "found" } else { "not found" }
    );
    println!(
        "Unsandboxed fallback: {}",
        if sandbox.allow_fallback { "allowed" } else { "disabled" }
    );
    if config_files.is_empty() {
        println!("Config: built-in defaults");
    } else {
        println!("Config: {}", config_files.join(", "));
    }

    Ok(())
}
