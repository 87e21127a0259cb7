//! Step binding: executor instance plus retry, delay and timeout settings

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{cancel_pair, Executor, ExecutorError, ExecutorRegistry, StepContext};
use crate::models::{ExecutorResult, TestStep};

/// A step resolved against the registry; lives for one step run
#[derive(Clone)]
pub struct ExecutorWrap {
    pub executor: Arc<dyn Executor>,
    pub retry: u64,
    /// Seconds between retries
    pub delay: u64,
    /// Per-attempt deadline in seconds, at least 1
    pub timeout: u64,
}

impl ExecutorWrap {
    /// Resolve the step's executor and its retry/delay/timeout keys.
    ///
    /// A step without `timeout` gets `default_timeout`; zero is raised to one second.
    pub fn resolve(
        registry: &ExecutorRegistry,
        step: &TestStep,
        default_timeout: u64,
    ) -> Result<Self, ExecutorError> {
        let executor = registry.instantiate(step)?;
        Ok(Self {
            executor,
            retry: step.retry().unwrap_or(0),
            delay: step.delay().unwrap_or(0),
            timeout: step.timeout().unwrap_or(default_timeout).max(1),
        })
    }

    pub fn default_assertions(&self) -> Option<Vec<String>> {
        self.executor
            .default_assertions_capability()
            .map(|capability| capability.default_assertions())
    }

    /// One attempt under the step deadline.
    ///
    /// The executor runs on its own task; this call returns on whichever comes
    /// first of result, error or deadline. On deadline the step's cancel
    /// signal fires but the task is not aborted.
    pub async fn invoke(&self, ctx: StepContext) -> Result<ExecutorResult, ExecutorError> {
        let (cancel, signal) = cancel_pair();
        let ctx = ctx.with_cancel(signal);
        let executor = Arc::clone(&self.executor);

        let task = tokio::spawn(async move { executor.run(&ctx).await });

        match tokio::time::timeout(Duration::from_secs(self.timeout), task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(ExecutorError::Invocation(format!(
                "executor task failed: {join_error}"
            ))),
            Err(_) => {
                warn!(timeout = self.timeout, "step deadline elapsed");
                cancel.cancel();
                debug!("cancel signal sent to executor");
                Err(ExecutorError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for ExecutorWrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorWrap")
            .field("retry", &self.retry)
            .field("delay", &self.delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}
