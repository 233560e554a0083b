//! Script execution endpoint.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Response header naming the path the script took.
pub const EXECUTION_MODE_HEADER: &str = "x-execution-mode";

/// Request body for `POST /execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Python source defining `main()`.
    pub script: String,
}

/// Successful execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Return value of `main()`.
    pub result: Value,
    /// Output printed by `main()`.
    pub stdout: String,
}

/// Run a submitted script and return what `main()` returned.
pub async fn execute_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(rejection_to_error)?;

    let result = state.executor.execute(&request.script).await?;

    let headers = [(EXECUTION_MODE_HEADER, result.mode.as_str())];
    let body = ExecuteResponse {
        result: result.result,
        stdout: result.stdout,
    };
    Ok((headers, Json(body)).into_response())
}

fn rejection_to_error(rejection: JsonRejection) -> ServerError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::BadRequest(rejection.body_text())
    }
}

/// Create execution routes.
pub fn execute_routes() -> Router<AppState> {
    Router::new().route("/execute", post(execute_handler))
}
