//! Canned runners for router tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;

use scriptbox_exec::{
    ErrorFrame, ErrorFrameKind, ExecutionMode, Executor, ExecutorConfig, HarnessedScript,
    ScriptRunner, SuccessFrame,
};
use scriptbox_sandbox::ExecutionOutcome;

use crate::{AppState, Server, ServerConfig};

pub(crate) enum Reply {
    Success(Value, &'static str),
    Exception(&'static str),
    Unserializable,
}

/// Answers every script with the same frame, as the harness would print it.
pub(crate) struct CannedRunner(pub Reply);

#[async_trait]
impl ScriptRunner for CannedRunner {
    async fn run(&self, script: &HarnessedScript) -> ExecutionOutcome {
        let markers = script.markers();
        let (stdout, code) = match &self.0 {
            Reply::Success(value, printed) => (
                markers.success_line(&SuccessFrame {
                    main_result: value.clone(),
                    stdout: printed.to_string(),
                }),
                0,
            ),
            Reply::Exception(message) => (
                markers.error_line(&ErrorFrame {
                    kind: ErrorFrameKind::Exception,
                    message: message.to_string(),
                }),
                1,
            ),
            Reply::Unserializable => (
                markers.error_line(&ErrorFrame {
                    kind: ErrorFrameKind::Unserializable,
                    message: "main() must return JSON-serializable data".to_string(),
                }),
                1,
            ),
        };
        ExecutionOutcome::new(ExecutionMode::Isolated, stdout.unwrap(), String::new(), code)
    }
}

pub(crate) fn test_state(reply: Reply) -> AppState {
    let executor = Executor::new(Arc::new(CannedRunner(reply)), ExecutorConfig::default());
    let config = ServerConfig::new().with_request_logging(false);
    AppState::new(executor, config)
}

pub(crate) fn test_router(reply: Reply) -> Router {
    Server::from_state(test_state(reply)).router()
}
