//! Test execution engine
//!
//! Suites run concurrently up to the configured bound; cases and steps inside
//! a suite always run sequentially.

mod context;
#[cfg(test)]
mod mock;
mod parallel;
mod runner;

pub use context::{RunContext, RunSettings, DEFAULT_TIMEOUT_SECS};
pub use parallel::Orchestrator;
pub use runner::SuiteRunner;
