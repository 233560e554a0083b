//! Application state shared across handlers.

use std::sync::Arc;

use scriptbox_exec::Executor;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The execution pipeline.
    pub executor: Arc<Executor>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(executor: Executor, config: ServerConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            config: Arc::new(config),
        }
    }
}
