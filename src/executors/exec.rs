//! `exec` executor: runs a shell script

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::{DefaultAssertions, Executor, ExecutorError, StepContext};
use crate::models::ExecutorResult;

pub const NAME: &str = "exec";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecExecutor {
    #[serde(default)]
    pub script: String,
}

#[derive(Debug, Serialize)]
struct ExecResult {
    systemout: String,
    systemerr: String,
    code: i32,
    timeseconds: f64,
    timehuman: String,
}

#[async_trait]
impl Executor for ExecExecutor {
    async fn run(&self, ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        if self.script.trim().is_empty() {
            return Err(ExecutorError::Invocation("Invalid command".to_string()));
        }

        let script = ctx.expand(&self.script);
        debug!(suite = ctx.suite(), case = ctx.case(), "exec: {}", script);

        let start = Instant::now();
        let child = Command::new("sh")
            .arg("-c")
            .arg(&script)
            .current_dir(ctx.workdir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = ctx.cancelled() => return Err(ExecutorError::Cancelled),
        };
        let elapsed = start.elapsed();

        let result = ExecResult {
            systemout: String::from_utf8_lossy(&output.stdout)
                .trim_end_matches('\n')
                .to_string(),
            systemerr: String::from_utf8_lossy(&output.stderr)
                .trim_end_matches('\n')
                .to_string(),
            code: output.status.code().unwrap_or(-1),
            timeseconds: elapsed.as_secs_f64(),
            timehuman: format!("{elapsed:?}"),
        };

        Ok(ExecutorResult::from_serializable(&result)?)
    }

    fn default_assertions_capability(&self) -> Option<&dyn DefaultAssertions> {
        Some(self)
    }
}

impl DefaultAssertions for ExecExecutor {
    fn default_assertions(&self) -> Vec<String> {
        vec!["result.code ShouldEqual 0".to_string()]
    }
}
