//! Suite, case and step runners
//!
//! Cases of a suite and steps of a case always run one after another: a step
//! may depend on what the previous one did, and a case stops at its first
//! failing step.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::RunContext;
use crate::executors::{ExecutorWrap, StepContext};
use crate::models::{Failure, TestCase, TestStep, TestSuite};
use crate::output::suite_status_line;
use crate::utils::Timer;

/// Records produced by one step, across all of its attempts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub errors: Vec<Failure>,
    pub failures: Vec<Failure>,
    pub attempts: u64,
    /// The last attempt's checks all passed
    pub passed: bool,
}

impl StepOutcome {
    /// No attempt left a record
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.failures.is_empty()
    }
}

/// Runs suites against a shared [`RunContext`]
pub struct SuiteRunner<'a> {
    ctx: &'a RunContext,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Run every non-skipped case in file order, then roll up the counters
    pub async fn run_suite(&self, suite: &mut TestSuite) {
        let timer = Timer::start(&suite.package);
        info!(suite = %suite.name, cases = suite.total, "start");

        let name = suite.name.clone();
        let package = suite.package.clone();
        let workdir = suite_workdir(&package);

        suite.failures = 0;
        suite.errors = 0;
        suite.skipped = 0;

        for case in suite.test_cases.iter_mut() {
            if case.is_skipped() {
                debug!(suite = %name, case = %case.name, "skipped");
            } else {
                self.run_case(&name, &package, &workdir, case).await;
            }

            suite.failures += case.failures.len();
            suite.errors += case.errors.len();
            suite.skipped += case.skipped as usize;
        }

        let elapsed = timer.stop();
        let status = suite_status_line(suite, elapsed, self.ctx.settings.details);
        match &self.ctx.progress {
            Some(progress) => progress.finish(&package, &status),
            None => println!("{status}"),
        }

        info!(
            suite = %name,
            failures = suite.failures,
            errors = suite.errors,
            "end in {}ms",
            elapsed.as_millis()
        );
    }

    /// Run a case's steps in order, stopping at the first step leaving a record
    pub async fn run_case(&self, suite: &str, package: &str, workdir: &Path, case: &mut TestCase) {
        info!(suite, case = %case.name, "start");

        let step_ctx =
            StepContext::new(self.ctx.aliases.clone(), suite, &case.name).with_workdir(workdir);

        for (index, step) in case.steps.iter().enumerate() {
            let wrap = match ExecutorWrap::resolve(
                &self.ctx.registry,
                step,
                self.ctx.settings.default_timeout_secs,
            ) {
                Ok(wrap) => wrap,
                Err(err) => {
                    warn!(suite, case = %case.name, step = index, "cannot resolve step: {}", err);
                    case.errors.push(Failure::new(err.to_string()));
                    break;
                }
            };

            let outcome = self.run_step(&wrap, step, step_ctx.clone()).await;
            if let Some(progress) = &self.ctx.progress {
                progress.increment(package);
            }

            let failed = !outcome.is_ok();
            case.errors.extend(outcome.errors);
            case.failures.extend(outcome.failures);
            if failed {
                debug!(suite, case = %case.name, step = index, "step failed, stopping case");
                break;
            }
        }

        info!(suite, case = %case.name, "end");
    }

    /// Invoke a step up to `retry + 1` times, stopping at the first attempt
    /// whose checks all pass.
    ///
    /// Records from every attempt are returned, including attempts made
    /// before a passing one. A step that never passes after more than one
    /// attempt also gets a note of the attempt count.
    pub async fn run_step(
        &self,
        wrap: &ExecutorWrap,
        step: &TestStep,
        step_ctx: StepContext,
    ) -> StepOutcome {
        let declared = step.assertions();
        let defaults = wrap.default_assertions();

        let mut outcome = StepOutcome::default();

        for attempt in 0..=wrap.retry {
            if self.delays_before(attempt) && wrap.delay > 0 {
                debug!("sleep {}s before attempt {}", wrap.delay, attempt + 1);
                tokio::time::sleep(Duration::from_secs(wrap.delay)).await;
            }
            outcome.attempts += 1;

            let result = match wrap.invoke(step_ctx.clone()).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(
                        suite = step_ctx.suite(),
                        case = step_ctx.case(),
                        attempt = attempt + 1,
                        "step invocation failed: {}",
                        err
                    );
                    outcome.errors.push(Failure::new(err.to_string()));
                    continue;
                }
            };
            debug!(entries = result.len(), "step result");

            let checked = self
                .ctx
                .checker
                .evaluate(&result, &declared, defaults.as_deref());
            if checked.is_ok {
                outcome.passed = true;
                break;
            }
            outcome.errors.extend(checked.errors);
            outcome.failures.extend(checked.failures);
        }

        if outcome.passed {
            if !outcome.is_ok() {
                debug!(
                    attempts = outcome.attempts,
                    "step passed after earlier attempts left records"
                );
            }
        } else if outcome.attempts > 1 {
            outcome.failures.push(Failure::new(format!(
                "It's a failure after {} attempt(s)",
                outcome.attempts
            )));
        }
        outcome
    }

    /// The first retry fires immediately unless `delay_first_retry` is set
    fn delays_before(&self, attempt: u64) -> bool {
        attempt > 1 || (attempt == 1 && self.ctx.settings.delay_first_retry)
    }
}

/// Directory of the suite file; relative step paths resolve against it
fn suite_workdir(package: &str) -> PathBuf {
    match Path::new(package).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{
        registry, step, BrokenExecutor, FlakyExecutor, HangingExecutor, SequenceExecutor,
        StatusExecutor,
    };
    use crate::engine::RunSettings;
    use crate::executors::{Executor, ExecutorRegistry};
    use crate::models::{Aliases, DetailsLevel};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Instant;

    fn context(registry: ExecutorRegistry) -> RunContext {
        RunContext::new(
            Aliases::default(),
            Arc::new(registry),
            RunSettings::default().with_details(DetailsLevel::Low),
        )
    }

    async fn run_case(ctx: &RunContext, steps: Vec<TestStep>) -> TestCase {
        let mut case = TestCase::new("case", steps);
        SuiteRunner::new(ctx)
            .run_case("suite", "suite.yml", Path::new("."), &mut case)
            .await;
        case
    }

    #[tokio::test]
    async fn test_stops_at_first_failing_step() {
        let failing = StatusExecutor::new(500);
        let second = StatusExecutor::new(200);
        let third = StatusExecutor::new(200);
        let ctx = context(registry(vec![
            ("a", failing.clone() as Arc<dyn Executor>),
            ("b", second.clone() as Arc<dyn Executor>),
            ("c", third.clone() as Arc<dyn Executor>),
        ]));

        let case = run_case(&ctx, vec![step("type: a"), step("type: b"), step("type: c")]).await;

        assert_eq!(failing.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert_eq!(third.calls(), 0);
        assert_eq!(case.failures.len(), 1);
        assert!(case.errors.is_empty());
    }

    #[tokio::test]
    async fn test_all_steps_run_when_passing() {
        let ok = StatusExecutor::new(200);
        let ctx = context(registry(vec![("ok", ok.clone() as Arc<dyn Executor>)]));

        let case = run_case(&ctx, vec![step("type: ok"), step("type: ok"), step("type: ok")]).await;

        assert_eq!(ok.calls(), 3);
        assert!(!case.is_failed());
    }

    #[tokio::test]
    async fn test_retry_bound_and_attempt_note() {
        let failing = StatusExecutor::new(404);
        let ctx = context(registry(vec![("mock", failing.clone() as Arc<dyn Executor>)]));

        let case = run_case(&ctx, vec![step("type: mock\nretry: 2")]).await;

        assert_eq!(failing.calls(), 3);
        assert_eq!(case.failures.len(), 4);
        assert_eq!(
            case.failures.last().map(|f| f.value.as_str()),
            Some("It's a failure after 3 attempt(s)")
        );
    }

    #[tokio::test]
    async fn test_no_attempt_note_without_retry() {
        let failing = StatusExecutor::new(404);
        let ctx = context(registry(vec![("mock", failing.clone() as Arc<dyn Executor>)]));

        let case = run_case(&ctx, vec![step("type: mock")]).await;

        assert_eq!(failing.calls(), 1);
        assert_eq!(case.failures.len(), 1);
        assert!(!case.failures[0].value.contains("attempt(s)"));
    }

    #[tokio::test]
    async fn test_failed_attempts_before_recovery_are_kept() {
        let flaky = SequenceExecutor::new(&[503, 200]);
        let after = StatusExecutor::new(200);
        let ctx = context(registry(vec![
            ("mock", flaky.clone() as Arc<dyn Executor>),
            ("after", after.clone() as Arc<dyn Executor>),
        ]));

        let case = run_case(
            &ctx,
            vec![
                step("type: mock\nretry: 3\nassertions:\n  - result.statusCode ShouldEqual 200"),
                step("type: after"),
            ],
        )
        .await;

        assert_eq!(flaky.calls(), 2);
        assert_eq!(case.failures.len(), 1);
        assert!(!case.failures[0].value.contains("attempt(s)"));
        assert!(case.errors.is_empty());
        assert_eq!(after.calls(), 0);
    }

    #[tokio::test]
    async fn test_invocation_error_before_recovery_is_kept() {
        let flaky = FlakyExecutor::new(1, 200);
        let ctx = context(registry(vec![("mock", flaky.clone() as Arc<dyn Executor>)]));

        let case = run_case(&ctx, vec![step("type: mock\nretry: 2")]).await;

        assert_eq!(flaky.calls(), 2);
        assert_eq!(case.errors.len(), 1);
        assert_eq!(case.errors[0].value, "connection refused");
        assert!(case.failures.is_empty());
    }

    #[tokio::test]
    async fn test_step_passing_first_time_leaves_no_records() {
        let ok = SequenceExecutor::new(&[200]);
        let ctx = context(registry(vec![("mock", ok.clone() as Arc<dyn Executor>)]));

        let declared =
            step("type: mock\nretry: 2\nassertions:\n  - result.statusCode ShouldEqual 200");
        let wrap = ExecutorWrap::resolve(&ctx.registry, &declared, 60).unwrap();
        let outcome = SuiteRunner::new(&ctx)
            .run_step(
                &wrap,
                &declared,
                StepContext::new(ctx.aliases.clone(), "suite", "case"),
            )
            .await;

        assert!(outcome.passed);
        assert!(outcome.is_ok());
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_invocation_errors_are_retried() {
        let broken = Arc::new(BrokenExecutor::default());
        let ctx = context(registry(vec![("mock", broken.clone() as Arc<dyn Executor>)]));

        let case = run_case(&ctx, vec![step("type: mock\nretry: 1"), step("type: mock")]).await;

        assert_eq!(broken.calls.load(Ordering::SeqCst), 2);
        assert_eq!(case.errors.len(), 2);
        assert_eq!(case.errors[0].value, "connection refused");
        assert_eq!(
            case.failures.last().map(|f| f.value.as_str()),
            Some("It's a failure after 2 attempt(s)")
        );
    }

    #[tokio::test]
    async fn test_timeout_yields_one_error() {
        let ctx = context(registry(vec![(
            "hang",
            Arc::new(HangingExecutor) as Arc<dyn Executor>,
        )]));

        let started = Instant::now();
        let case = run_case(&ctx, vec![step("type: hang\ntimeout: 1")]).await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(case.errors.len(), 1);
        assert_eq!(case.errors[0].value, "Timeout after 1 second(s)");
        assert!(case.failures.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_executor_ends_case() {
        let ok = StatusExecutor::new(200);
        let ctx = context(registry(vec![("ok", ok.clone() as Arc<dyn Executor>)]));

        let case = run_case(&ctx, vec![step("type: nope"), step("type: ok")]).await;

        assert_eq!(ok.calls(), 0);
        assert_eq!(case.errors.len(), 1);
        assert_eq!(case.errors[0].value, "Type 'nope' is not implemented");
    }

    #[tokio::test]
    async fn test_first_retry_is_immediate() {
        let failing = StatusExecutor::new(500);
        let ctx = context(registry(vec![("mock", failing.clone() as Arc<dyn Executor>)]));

        let started = Instant::now();
        run_case(&ctx, vec![step("type: mock\nretry: 2\ndelay: 1")]).await;
        let elapsed = started.elapsed();

        assert_eq!(failing.calls(), 3);
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1900));
    }

    #[tokio::test]
    async fn test_delay_first_retry_setting() {
        let failing = StatusExecutor::new(500);
        let mut ctx = context(registry(vec![("mock", failing.clone() as Arc<dyn Executor>)]));
        ctx.settings = ctx.settings.clone().with_delay_first_retry(true);

        let started = Instant::now();
        run_case(&ctx, vec![step("type: mock\nretry: 1\ndelay: 1")]).await;

        assert_eq!(failing.calls(), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_suite_rollup() {
        let ok = StatusExecutor::new(200);
        let ko = StatusExecutor::new(404);
        let ctx = context(registry(vec![
            ("ok", ok.clone() as Arc<dyn Executor>),
            ("ko", ko.clone() as Arc<dyn Executor>),
        ]));

        let mut suite = TestSuite::new(
            "rollup",
            vec![
                TestCase::new("passes", vec![step("type: ok")]),
                TestCase::new("fails", vec![step("type: ko"), step("type: ok")]),
                TestCase::new("broken", vec![step("type: missing")]),
                TestCase::new("off", vec![step("type: ko")]).skip(),
            ],
        );
        suite.prepare("rollup.yml");

        SuiteRunner::new(&ctx).run_suite(&mut suite).await;

        assert_eq!(suite.total, 4);
        assert_eq!(suite.failures, 1);
        assert_eq!(suite.errors, 1);
        assert_eq!(suite.skipped, 1);
        assert_eq!(suite.failed_cases(), 2);
        assert_eq!(ok.calls(), 1);
        assert_eq!(ko.calls(), 1);
        assert!(!suite.passed());
    }

    #[tokio::test]
    async fn test_declared_assertion_end_to_end() {
        for (status, expected_failures) in [(200u16, 0usize), (404, 1)] {
            let mock = StatusExecutor::new(status);
            let ctx = context(registry(vec![("mock", mock as Arc<dyn Executor>)]));

            let mut suite = TestSuite::new(
                "e2e",
                vec![TestCase::new(
                    "status",
                    vec![step(
                        "type: mock\nassertions:\n  - result.statusCode ShouldEqual 200",
                    )],
                )],
            );
            suite.prepare("e2e.yml");
            SuiteRunner::new(&ctx).run_suite(&mut suite).await;

            assert_eq!(suite.failures, expected_failures);
            assert_eq!(suite.errors, 0);
        }
    }

    #[test]
    fn test_suite_workdir() {
        assert_eq!(suite_workdir("suites/api.yml"), PathBuf::from("suites"));
        assert_eq!(suite_workdir("api.yml"), PathBuf::from("."));
    }
}
