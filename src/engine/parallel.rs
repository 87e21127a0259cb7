//! Run orchestration
//!
//! Discovers suite files, parses them concurrently, then runs suites behind a
//! bounded admission gate. Finished suites are folded into the run totals by
//! a single collector task, so the totals never see concurrent writers.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use super::{RunContext, RunSettings, SuiteRunner};
use crate::assertions::{CheckEvaluator, DefaultChecker};
use crate::discovery::{discover, load_suite};
use crate::executors::ExecutorRegistry;
use crate::models::{Aliases, TestSuite, Tests};
use crate::output::ProgressRegistry;
use crate::utils::Timer;

/// Entry point of a run
pub struct Orchestrator {
    registry: Arc<ExecutorRegistry>,
    checker: Arc<dyn CheckEvaluator>,
    settings: RunSettings,
    progress: Option<Arc<ProgressRegistry>>,
}

impl Orchestrator {
    /// Orchestrator over the built-in executors
    pub fn new(settings: RunSettings) -> Self {
        Self {
            registry: Arc::new(ExecutorRegistry::builtin()),
            checker: Arc::new(DefaultChecker),
            settings,
            progress: None,
        }
    }

    #[cfg(test)]
    pub fn with_registry(mut self, registry: ExecutorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Use this progress registry instead of creating one from the details level
    #[cfg(test)]
    pub fn with_progress(mut self, progress: Arc<ProgressRegistry>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every suite found at `path` and return the aggregated results.
    ///
    /// Only discovery errors abort the run. Files that cannot be read or
    /// decoded are logged and left out of the results.
    pub async fn process(&self, path: &str, aliases: &[String]) -> Result<Tests> {
        let timer = Timer::start("run");

        let aliases = Aliases::parse(aliases);
        debug!(aliases = aliases.len(), "aliases parsed");

        let files = discover(path).with_context(|| format!("Failed to discover suites in {path}"))?;
        info!("{} suite file(s) found in {}", files.len(), path);

        let progress = self.progress.clone().or_else(|| {
            self.settings
                .details
                .shows_progress()
                .then(|| Arc::new(ProgressRegistry::new()))
        });

        let suites = self.parse_all(files, progress.as_deref()).await;

        let mut ctx = RunContext::new(aliases, Arc::clone(&self.registry), self.settings.clone())
            .with_checker(Arc::clone(&self.checker));
        if let Some(progress) = progress {
            ctx = ctx.with_progress(progress);
        }

        let mut tests = self.run_all(Arc::new(ctx), suites).await;
        tests
            .test_suites
            .sort_by(|a, b| a.package.cmp(&b.package));
        tests.duration_ms = timer.stop().as_millis() as u64;

        info!(
            total = tests.total,
            ok = tests.total_ok,
            ko = tests.total_ko,
            skipped = tests.total_skipped,
            "run completed in {}ms",
            tests.duration_ms
        );
        Ok(tests)
    }

    /// Parse every file concurrently; execution starts only once all are done
    async fn parse_all(
        &self,
        files: Vec<PathBuf>,
        progress: Option<&ProgressRegistry>,
    ) -> Vec<TestSuite> {
        let handles: Vec<_> = files
            .into_iter()
            .map(|file| tokio::spawn(async move { load_suite(&file).await }))
            .collect();

        let mut suites = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(Ok(suite)) => {
                    if let Some(progress) = progress {
                        progress.register(&suite.package, suite.step_count());
                    }
                    suites.push(suite);
                }
                Ok(Err(err)) => warn!("Skipping suite: {}", err),
                Err(err) => warn!("Parse task failed: {}", err),
            }
        }
        suites
    }

    /// Run suites with at most `parallel` in flight.
    ///
    /// A single collector task owns the aggregate and folds each finished
    /// suite into it as it arrives.
    async fn run_all(&self, ctx: Arc<RunContext>, suites: Vec<TestSuite>) -> Tests {
        let semaphore = Arc::new(Semaphore::new(self.settings.parallel.max(1)));
        let (tx, mut rx) = mpsc::channel::<TestSuite>(suites.len().max(1));

        let mut tests = Tests::new();
        let collector = tokio::spawn(async move {
            while let Some(suite) = rx.recv().await {
                debug!(suite = %suite.name, "collected");
                tests.record(suite);
            }
            tests
        });

        let mut handles = Vec::with_capacity(suites.len());
        for mut suite in suites {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                warn!("Admission gate closed, {} not run", suite.package);
                continue;
            };
            let ctx = Arc::clone(&ctx);
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                SuiteRunner::new(&ctx).run_suite(&mut suite).await;
                drop(permit);
                if tx.send(suite).await.is_err() {
                    warn!("Collector stopped before all suites finished");
                }
            }));
        }
        drop(tx);

        for joined in join_all(handles).await {
            if let Err(err) = joined {
                warn!("Suite task failed: {}", err);
            }
        }

        match collector.await {
            Ok(tests) => tests,
            Err(err) => {
                warn!("Collector task failed: {}", err);
                Tests::new()
            }
        }
    }
}
