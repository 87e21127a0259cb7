//! Run-scoped context shared by every runner of one run

use std::sync::Arc;

use crate::assertions::{CheckEvaluator, DefaultChecker};
use crate::executors::ExecutorRegistry;
use crate::models::{Aliases, DetailsLevel};
use crate::output::ProgressRegistry;

/// Default per-attempt deadline when a step sets none
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Run settings
#[derive(Clone, Debug)]
pub struct RunSettings {
    /// Suites executing at once, at least 1
    pub parallel: usize,
    pub details: DetailsLevel,
    pub default_timeout_secs: u64,
    /// Wait `delay` before the first retry too; by default the first retry is immediate
    pub delay_first_retry: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            parallel: 1,
            details: DetailsLevel::default(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_first_retry: false,
        }
    }
}

impl RunSettings {
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn with_details(mut self, details: DetailsLevel) -> Self {
        self.details = details;
        self
    }

    pub fn with_default_timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    pub fn with_delay_first_retry(mut self, enabled: bool) -> Self {
        self.delay_first_retry = enabled;
        self
    }
}

/// Built once per run and handed to every suite task by `Arc`.
/// Nothing in it is mutated while suites run, apart from progress bars.
pub struct RunContext {
    pub aliases: Arc<Aliases>,
    pub registry: Arc<ExecutorRegistry>,
    pub checker: Arc<dyn CheckEvaluator>,
    pub settings: RunSettings,
    pub progress: Option<Arc<ProgressRegistry>>,
}

impl RunContext {
    pub fn new(aliases: Aliases, registry: Arc<ExecutorRegistry>, settings: RunSettings) -> Self {
        Self {
            aliases: Arc::new(aliases),
            registry,
            checker: Arc::new(DefaultChecker),
            settings,
            progress: None,
        }
    }

    pub fn with_checker(mut self, checker: Arc<dyn CheckEvaluator>) -> Self {
        self.checker = checker;
        self
    }

    pub fn with_progress(mut self, progress: Arc<ProgressRegistry>) -> Self {
        self.progress = Some(progress);
        self
    }
}
