//! Per-suite progress display
//!
//! Bars are registered by the parse tasks before any suite runs; suite runners
//! only advance and finish their own bar afterwards.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Width package names are padded to in status lines
pub const PACKAGE_WIDTH: usize = 47;

/// Pad or truncate `s` to exactly `width` characters
pub fn right_pad(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

pub struct ProgressRegistry {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Registry whose bars draw nowhere
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// Add a bar for a suite with `steps` steps
    pub fn register(&self, package: &str, steps: usize) {
        let bar = self.multi.add(ProgressBar::new(steps as u64));
        if let Ok(style) = ProgressStyle::with_template("{prefix} {bar:30.cyan/blue} {pos}/{len}") {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_prefix(format!("⚙ {}", right_pad(package, PACKAGE_WIDTH)));

        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(package.to_string(), bar);
    }

    fn bar(&self, package: &str) -> Option<ProgressBar> {
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(package)
            .cloned()
    }

    pub fn increment(&self, package: &str) {
        if let Some(bar) = self.bar(package) {
            bar.inc(1);
        }
    }

    /// Replace the bar's prefix with the suite's status line and stop it
    pub fn finish(&self, package: &str, status: &str) {
        if let Some(bar) = self.bar(package) {
            bar.set_prefix(status.to_string());
            bar.finish();
        }
    }

    #[cfg(test)]
    pub fn position(&self, package: &str) -> Option<u64> {
        self.bar(package).map(|bar| bar.position())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for ProgressRegistry {
    fn default() -> Self {
        Self::new()
    }
}
