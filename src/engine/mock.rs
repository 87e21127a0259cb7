//! Mock executors for engine tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::executors::{DefaultAssertions, Executor, ExecutorError, ExecutorRegistry, StepContext};
use crate::models::{ExecutorResult, TestStep};

pub fn step(yaml: &str) -> TestStep {
    TestStep::from_yaml(yaml).unwrap()
}

pub fn registry(executors: Vec<(&str, Arc<dyn Executor>)>) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    for (name, executor) in executors {
        registry.register_instance(name, executor);
    }
    registry
}

/// Answers with a fixed status code
#[derive(Default)]
pub struct StatusExecutor {
    pub status: u16,
    pub calls: AtomicUsize,
}

impl StatusExecutor {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for StatusExecutor {
    async fn run(&self, _ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutorResult::new().with("result.statusCode", self.status))
    }

    fn default_assertions_capability(&self) -> Option<&dyn DefaultAssertions> {
        Some(self)
    }
}

impl DefaultAssertions for StatusExecutor {
    fn default_assertions(&self) -> Vec<String> {
        vec!["result.statusCode ShouldEqual 200".to_string()]
    }
}

/// Plays back status codes in order, repeating the last one
pub struct SequenceExecutor {
    statuses: Mutex<VecDeque<u16>>,
    pub calls: AtomicUsize,
}

impl SequenceExecutor {
    pub fn new(statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for SequenceExecutor {
    async fn run(&self, _ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let status = {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().copied().unwrap_or(500)
            }
        };
        Ok(ExecutorResult::new().with("result.statusCode", status))
    }
}

/// Always fails the invocation itself
#[derive(Default)]
pub struct BrokenExecutor {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Executor for BrokenExecutor {
    async fn run(&self, _ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ExecutorError::Invocation("connection refused".to_string()))
    }
}

/// Fails the invocation for the first `failing` calls, then answers with `status`
pub struct FlakyExecutor {
    failing: usize,
    status: u16,
    pub calls: AtomicUsize,
}

impl FlakyExecutor {
    pub fn new(failing: usize, status: u16) -> Arc<Self> {
        Arc::new(Self {
            failing,
            status,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for FlakyExecutor {
    async fn run(&self, _ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failing {
            return Err(ExecutorError::Invocation("connection refused".to_string()));
        }
        Ok(ExecutorResult::new().with("result.statusCode", self.status))
    }
}

/// Never returns and ignores cancellation
pub struct HangingExecutor;

#[async_trait]
impl Executor for HangingExecutor {
    async fn run(&self, _ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        std::future::pending::<()>().await;
        Ok(ExecutorResult::new())
    }
}

/// Records how many invocations overlap
pub struct TrackingExecutor {
    hold: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl TrackingExecutor {
    pub fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            hold,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for TrackingExecutor {
    async fn run(&self, _ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ExecutorResult::new().with("result.statusCode", 200))
    }
}
