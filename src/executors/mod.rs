//! Pluggable step executors
//!
//! An executor performs one concrete action (run a command, call an HTTP
//! endpoint, read files) and flattens what it observed into an
//! [`ExecutorResult`]. Steps pick their executor through the `type` key.

mod context;
mod exec;
mod http;
mod readfile;
mod registry;
mod wrap;

pub use context::{cancel_pair, StepContext};
pub use exec::ExecExecutor;
pub use http::HttpExecutor;
pub use readfile::ReadFileExecutor;
pub use registry::ExecutorRegistry;
pub use wrap::ExecutorWrap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ExecutorResult;

/// Executor errors
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Type '{0}' is not implemented")]
    UnknownType(String),

    #[error("Invalid '{executor}' step: {message}")]
    Decode { executor: String, message: String },

    #[error("{0}")]
    Invocation(String),

    #[error("Timeout after {0} second(s)")]
    Timeout(u64),

    #[error("Step cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cannot flatten result: {0}")]
    Result(#[from] serde_json::Error),
}

/// A runnable step.
///
/// Implementations are the step's parameters decoded into the executor's own
/// shape. `run` must be safe to call more than once (retries).
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(&self, ctx: &StepContext) -> Result<ExecutorResult, ExecutorError>;

    /// Optional capability, queried when a step declares no assertions
    fn default_assertions_capability(&self) -> Option<&dyn DefaultAssertions> {
        None
    }
}

/// Assertions applied when a step declares none
pub trait DefaultAssertions {
    fn default_assertions(&self) -> Vec<String>;
}
