//! Pipeline orchestration: validate, harness, run, decode.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use scriptbox_sandbox::{ExecutionOutcome, SandboxRunner};

use crate::decode::{ExecutionResult, decode};
use crate::error::{ExecError, Result};
use crate::harness::{HarnessBuilder, HarnessedScript};
use crate::validate::validate;

/// Default number of scripts allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Something that can run a harnessed script to completion.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run the script and report what happened. Never fails; launch problems
    /// are reported through the outcome.
    async fn run(&self, script: &HarnessedScript) -> ExecutionOutcome;
}

#[async_trait]
impl ScriptRunner for SandboxRunner {
    async fn run(&self, script: &HarnessedScript) -> ExecutionOutcome {
        SandboxRunner::run(self, &script.to_job()).await
    }
}

/// Executor settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Scripts allowed to run at once. Zero is treated as one.
    pub max_concurrent: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl ExecutorConfig {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }
}

/// Pipeline stage, recorded on log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    Building,
    Executing,
    Decoding,
    Succeeded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Building => "building",
            Stage::Executing => "executing",
            Stage::Decoding => "decoding",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs submissions end to end.
///
/// Cheap to share behind an `Arc`; concurrent calls to
/// [`execute`](Self::execute) are capped by [`ExecutorConfig::max_concurrent`].
pub struct Executor {
    runner: Arc<dyn ScriptRunner>,
    harness: HarnessBuilder,
    permits: Arc<Semaphore>,
    config: ExecutorConfig,
}

impl Executor {
    /// Create an executor around any runner.
    pub fn new(runner: Arc<dyn ScriptRunner>, config: ExecutorConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            runner,
            harness: HarnessBuilder::new(),
            permits,
            config,
        }
    }

    /// Create an executor backed by a [`SandboxRunner`].
    pub fn from_sandbox(runner: SandboxRunner, config: ExecutorConfig) -> Self {
        Self::new(Arc::new(runner), config)
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execution slots currently free.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Validate, run and decode one script.
    ///
    /// Validation failures return before anything is written or spawned.
    pub async fn execute(&self, script: &str) -> Result<ExecutionResult> {
        let execution_id = Uuid::new_v4();
        debug!(%execution_id, stage = %Stage::Validating, chars = script.chars().count());

        if let Err(e) = validate(script) {
            info!(%execution_id, stage = %Stage::Failed, error = %e, "Script rejected");
            return Err(e.into());
        }

        debug!(%execution_id, stage = %Stage::Building);
        let harnessed = self.harness.build(script);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExecError::Execution("executor is shutting down".to_string()))?;

        debug!(%execution_id, stage = %Stage::Executing);
        let outcome = self.runner.run(&harnessed).await;

        debug!(
            %execution_id,
            stage = %Stage::Decoding,
            mode = %outcome.mode,
            exit_code = outcome.exit_code,
            timed_out = outcome.timed_out
        );
        let decoded = decode(&outcome, harnessed.markers());

        match &decoded {
            Ok(_) => info!(
                %execution_id,
                stage = %Stage::Succeeded,
                mode = %outcome.mode,
                "Script executed"
            ),
            Err(e) => warn!(
                %execution_id,
                stage = %Stage::Failed,
                mode = %outcome.mode,
                kind = %e.kind(),
                error = %e,
                "Script failed"
            ),
        }

        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use tokio::task::JoinSet;

    use scriptbox_sandbox::ExecutionMode;

    use crate::error::ValidationError;
    use crate::protocol::{ErrorFrame, ErrorFrameKind, SuccessFrame};

    enum Reply {
        Success(serde_json::Value),
        Error(&'static str, i32),
    }

    struct MockRunner {
        reply: Reply,
        calls: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl MockRunner {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ScriptRunner for MockRunner {
        async fn run(&self, script: &HarnessedScript) -> ExecutionOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            let markers = script.markers();
            let (stdout, code) = match &self.reply {
                Reply::Success(value) => (
                    markers
                        .success_line(&SuccessFrame {
                            main_result: value.clone(),
                            stdout: String::new(),
                        })
                        .unwrap(),
                    0,
                ),
                Reply::Error(message, code) => (
                    markers
                        .error_line(&ErrorFrame {
                            kind: ErrorFrameKind::Exception,
                            message: message.to_string(),
                        })
                        .unwrap(),
                    *code,
                ),
            };
            ExecutionOutcome::new(ExecutionMode::Isolated, stdout, String::new(), code)
        }
    }

    fn executor(runner: Arc<MockRunner>, max: usize) -> Executor {
        Executor::new(runner, ExecutorConfig::default().with_max_concurrent(max))
    }

    #[tokio::test]
    async fn test_validation_failure_skips_runner() {
        let runner = Arc::new(MockRunner::new(Reply::Success(json!(1))));
        let exec = executor(runner.clone(), 1);

        let err = exec.execute("print('hi')").await.unwrap_err();
        assert!(matches!(
            err,
            ExecError::Validation(ValidationError::MissingEntryPoint)
        ));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success() {
        let runner = Arc::new(MockRunner::new(Reply::Success(json!({"a": 1}))));
        let exec = executor(runner.clone(), 1);

        let result = exec.execute("def main():\n    return {'a': 1}\n").await.unwrap();
        assert_eq!(result.result, json!({"a": 1}));
        assert_eq!(result.mode, ExecutionMode::Isolated);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(exec.available_slots(), 1);
    }

    #[tokio::test]
    async fn test_script_error() {
        let runner = Arc::new(MockRunner::new(Reply::Error("Test error", 1)));
        let exec = executor(runner, 1);

        match exec.execute("def main():\n    raise ValueError('Test error')\n").await {
            Err(ExecError::Execution(msg)) => assert!(msg.contains("Test error")),
            other => panic!("expected Execution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_frame_with_zero_exit() {
        let runner = Arc::new(MockRunner::new(Reply::Error("swallowed", 0)));
        let exec = executor(runner, 1);

        assert!(matches!(
            exec.execute("def main():\n    return 1\n").await,
            Err(ExecError::Execution(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let runner = Arc::new(
            MockRunner::new(Reply::Success(json!(null))).with_delay(Duration::from_millis(50)),
        );
        let exec = Arc::new(executor(runner.clone(), 2));

        let mut tasks = JoinSet::new();
        for _ in 0..6 {
            let exec = exec.clone();
            tasks.spawn(async move { exec.execute("def main():\n    return None\n").await });
        }
        while let Some(joined) = tasks.join_next().await {
            assert!(joined.unwrap().is_ok());
        }

        assert_eq!(runner.calls.load(Ordering::SeqCst), 6);
        assert!(runner.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(exec.available_slots(), 2);
    }

    #[test]
    fn test_zero_concurrency_means_one_slot() {
        let runner = Arc::new(MockRunner::new(Reply::Success(json!(1))));
        let exec = executor(runner, 0);
        assert_eq!(exec.available_slots(), 1);
    }
}
