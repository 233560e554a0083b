//! CLI command handlers.

pub mod check;
pub mod run;
pub mod start;

use anyhow::Result;

use scriptbox_config::LoadedConfig;
use scriptbox_exec::Executor;
use scriptbox_sandbox::SandboxRunner;

use crate::settings;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
}

impl Context {
    /// Print the config files that were loaded (verbose mode only).
    pub fn report_sources(&self) {
        if !self.verbose {
            return;
        }
        let sources = self.loaded.loaded_from();
        if sources.is_empty() {
            eprintln!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                eprintln!("Loaded config: {}", source.display());
            }
        }
    }

    /// Build the execution pipeline from the loaded configuration.
    pub fn build_executor(&self) -> Result<Executor> {
        let config = &self.loaded.config;
        let runner = SandboxRunner::new(settings::sandbox_config(&config.sandbox()))?;
        Ok(Executor::from_sandbox(
            runner,
            settings::executor_config(&config.execution()),
        ))
    }
}
