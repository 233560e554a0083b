//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use scriptbox_exec::{Executor, ExecutorConfig};
use scriptbox_sandbox::{SandboxConfig, SandboxRunner};
use scriptbox_server::{Server, ServerConfig};

/// Locate a `python3` interpreter on `PATH`.
pub fn python() -> Option<PathBuf> {
    let output = std::process::Command::new("which")
        .arg("python3")
        .output()
        .ok()?;
    let path = String::from_utf8(output.stdout).ok()?;
    let path = path.trim();
    (output.status.success() && !path.is_empty()).then(|| PathBuf::from(path))
}

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
    /// Directory for temporary script files.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a server backed by the unsandboxed fallback.
    ///
    /// Returns `None` when no Python interpreter is available.
    pub async fn start() -> Result<Option<Self>> {
        let Some(interpreter) = python() else {
            eprintln!("python3 not found; skipping");
            return Ok(None);
        };

        let temp_dir = TempDir::new()?;
        let addr = find_available_port().await?;

        let sandbox = SandboxConfig::default()
            .with_interpreter(interpreter)
            .with_isolation_tool("/nonexistent/nsjail")
            .with_fallback_pythonpath(None)
            .with_time_limit(Duration::from_secs(10))
            .with_temp_dir(temp_dir.path());
        let executor =
            Executor::from_sandbox(SandboxRunner::new(sandbox)?, ExecutorConfig::default());

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);

        let server = Server::new(executor, config);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Some(Self {
            addr,
            client,
            _handle: handle,
            temp_dir,
        }))
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a GET request builder.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// Get a POST request builder.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
