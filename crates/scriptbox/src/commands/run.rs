//! Run command - executes one script file locally.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use serde_json::json;

use super::Context;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Python script defining main()
    pub file: PathBuf,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    ctx.report_sources();

    let script = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let executor = ctx.build_executor()?;
    let result = executor.execute(&script).await?;

    if ctx.json_output {
        let output = json!({
            "result": result.result,
            "stdout": result.stdout,
            "mode": result.mode,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", result.stdout);
        println!("{}", serde_json::to_string_pretty(&result.result)?);
        if ctx.verbose {
            eprintln!("Mode: {}", result.mode);
        }
    }

    Ok(())
}
