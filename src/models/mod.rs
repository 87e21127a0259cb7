//! Data models for suite execution
//!
//! Suites, cases and steps as decoded from disk, the flattened executor
//! result, run-scoped aliases and the run aggregate.

mod aliases;
mod result;
mod run;
mod suite;

pub use aliases::Aliases;
pub use result::{value_to_string, ExecutorResult};
pub use run::{DetailsLevel, Tests};
pub use suite::{Failure, TestCase, TestStep, TestSuite};
