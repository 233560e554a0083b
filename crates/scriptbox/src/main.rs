//! scriptbox - sandboxed Python script execution service
//!
//! Main entry point for the scriptbox CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use scriptbox_config::{ConfigSource, LoadedConfig, LoggingSection};

mod commands;
mod settings;

use commands::{check, run, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// scriptbox - run untrusted Python scripts and return what main() returns
#[derive(Parser)]
#[command(name = "scriptbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long, global = true, env = "SCRIPTBOX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start(start::StartArgs),

    /// Execute a script file once and print its result
    Run(run::RunArgs),

    /// Report isolation tool and interpreter availability
    Check(check::CheckArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

const CRATE_TARGETS: &[&str] = &[
    "scriptbox",
    "scriptbox_config",
    "scriptbox_exec",
    "scriptbox_sandbox",
    "scriptbox_server",
];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_configuration(cli.config.as_deref())?;
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    let _guard = init_tracing(&loaded.config.logging(), cli.verbose);

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Check(args) => check::run(args, &ctx).await,
    }
}

/// Load an explicit config file, or discover and merge the usual layers.
fn load_configuration(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = explicit else {
        return Ok(scriptbox_config::load_config(None)?);
    };

    let config = scriptbox_config::load_config_file(path)?;
    Ok(LoadedConfig {
        config,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings: Vec::new(),
    })
}

fn directives(level: &str, fallback: &str) -> String {
    let mut parts: Vec<String> = CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    parts.push(fallback.to_string());
    parts.join(",")
}

/// Console filter: `--verbose`, then `RUST_LOG`, then the config file's filter.
fn console_directives(
    logging: &LoggingSection,
    verbose: bool,
    rust_log: Option<String>,
) -> String {
    if verbose {
        return directives("debug", "info");
    }
    rust_log
        .filter(|value| !value.trim().is_empty())
        .or_else(|| logging.filter.clone())
        .unwrap_or_else(|| directives("info", "warn"))
}

/// Console (human-readable) plus an optional daily-rotated JSON file.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(logging: &LoggingSection, verbose: bool) -> Option<WorkerGuard> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let console_filter = EnvFilter::try_new(console_directives(logging, verbose, rust_log))
        .unwrap_or_else(|_| EnvFilter::new(directives("info", "warn")));

    let mut guard = None;
    let file_layer = if logging.file {
        let log_dir = logging
            .dir
            .clone()
            .or_else(scriptbox_config::log_dir)
            .unwrap_or_else(|| PathBuf::from("logs"));

        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("scriptbox")
            .filename_suffix("log")
            .build(&log_dir)
        {
            Ok(appender) => {
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_filter(EnvFilter::new(directives("trace", "info"))),
                )
            }
            Err(e) => {
                eprintln!(
                    "warning: file logging disabled, cannot write to {}: {}",
                    log_dir.display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_directives_cover_every_crate() {
        let filter = directives("debug", "warn");
        for target in CRATE_TARGETS {
            assert!(filter.contains(&format!("{target}=debug")));
        }
        assert!(filter.ends_with(",warn"));
    }

    #[test]
    fn test_rust_log_overrides_configured_filter() {
        let logging = LoggingSection {
            filter: Some("scriptbox_exec=trace".to_string()),
            ..Default::default()
        };

        assert_eq!(
            console_directives(&logging, false, Some("warn".to_string())),
            "warn"
        );
        assert_eq!(console_directives(&logging, false, None), "scriptbox_exec=trace");
        assert_eq!(
            console_directives(&logging, false, Some(String::new())),
            "scriptbox_exec=trace"
        );
        assert_eq!(
            console_directives(&LoggingSection::default(), false, None),
            directives("info", "warn")
        );
        assert_eq!(
            console_directives(&logging, true, Some("warn".to_string())),
            directives("debug", "info")
        );
    }

    #[test]
    fn test_parse_run_with_global_flags() {
        let cli = Cli::try_parse_from(["scriptbox", "run", "job.py", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => assert_eq!(args.file, PathBuf::from("job.py")),
            _ => panic!("expected run"),
        }
    }
}
