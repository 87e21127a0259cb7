//! Per-step execution context and cooperative cancellation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::Aliases;

/// Fires a step's [`CancelSignal`]
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may already be gone when the executor finished first
        let _ = self.tx.send(true);
    }
}

/// Cancellation observed by executors.
///
/// Cooperative only: an executor that never checks it keeps running after
/// its deadline until it finishes on its own.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pending forever otherwise
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// What an executor sees of the run while invoking one step
#[derive(Clone, Debug)]
pub struct StepContext {
    aliases: Arc<Aliases>,
    suite: String,
    case: String,
    workdir: PathBuf,
    cancel: CancelSignal,
}

impl StepContext {
    pub fn new(aliases: Arc<Aliases>, suite: impl Into<String>, case: impl Into<String>) -> Self {
        Self {
            aliases,
            suite: suite.into(),
            case: case.into(),
            workdir: PathBuf::from("."),
            cancel: CancelSignal::never(),
        }
    }

    /// Directory relative step paths are resolved against
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Expand `{{alias}}` references in a step parameter
    pub fn expand(&self, text: &str) -> String {
        self.aliases.expand(text)
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn case(&self) -> &str {
        &self.case
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
