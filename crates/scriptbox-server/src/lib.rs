//! HTTP API for scriptbox.
//!
//! Exposes the execution pipeline over HTTP:
//!
//! - `POST /execute` with `{"script": "..."}` returns `{"result", "stdout"}`
//!   and an `x-execution-mode` header
//! - `GET /health` for liveness checks
//! - `GET /` for service information
//!
//! Failures are JSON `{"code", "error"}` bodies: 400 for malformed requests
//! and rejected scripts, 413 for oversized bodies, 500 for scripts that fail
//! at runtime.
//!
//! # Example
//!
//! ```ignore
//! use scriptbox_exec::{Executor, ExecutorConfig};
//! use scriptbox_sandbox::{SandboxConfig, SandboxRunner};
//! use scriptbox_server::{Server, ServerConfig};
//!
//! let runner = SandboxRunner::new(SandboxConfig::default())?;
//! let executor = Executor::from_sandbox(runner, ExecutorConfig::default());
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//!
//! Server::new(executor, config).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use routes::{EXECUTION_MODE_HEADER, ExecuteRequest, ExecuteResponse};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use scriptbox_exec::Executor;

/// The scriptbox HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given executor and configuration.
    pub fn new(executor: Executor, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(executor, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::execute_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!(
            addr = %addr,
            slots = self.state.executor.available_slots(),
            "Server listening"
        );

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
