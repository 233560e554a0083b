//! API routes.

pub mod execute;
pub mod health;

pub use execute::{EXECUTION_MODE_HEADER, ExecuteRequest, ExecuteResponse, execute_routes};
pub use health::{HealthResponse, ServiceInfo, health_routes};
