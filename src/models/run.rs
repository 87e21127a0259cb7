//! Run-level aggregate and display settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TestSuite;

/// How much progress output a run produces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailsLevel {
    /// One status line per finished suite
    Low,
    /// Progress bar per suite
    #[default]
    Medium,
    /// Progress bars plus failing cases in the summary
    High,
}

impl DetailsLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(DetailsLevel::Low),
            "medium" => Some(DetailsLevel::Medium),
            "high" => Some(DetailsLevel::High),
            _ => None,
        }
    }

    pub fn shows_progress(self) -> bool {
        self != DetailsLevel::Low
    }
}

impl fmt::Display for DetailsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailsLevel::Low => write!(f, "low"),
            DetailsLevel::Medium => write!(f, "medium"),
            DetailsLevel::High => write!(f, "high"),
        }
    }
}

/// Aggregate over every suite of a run.
///
/// Only the orchestrator's collector mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tests {
    pub test_suites: Vec<TestSuite>,
    pub total_ok: usize,
    pub total_ko: usize,
    pub total_skipped: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Default for Tests {
    fn default() -> Self {
        Self::new()
    }
}

impl Tests {
    pub fn new() -> Self {
        Self {
            test_suites: Vec::new(),
            total_ok: 0,
            total_ko: 0,
            total_skipped: 0,
            total: 0,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    /// Fold one finished suite into the totals.
    ///
    /// Each case lands in exactly one bucket: skipped, KO (any failure or
    /// error record) or OK.
    pub fn record(&mut self, suite: TestSuite) {
        let ko = suite.failed_cases();
        let skipped = suite.skipped;
        let ok = suite.total.saturating_sub(ko + skipped);

        self.total_ok += ok;
        self.total_ko += ko;
        self.total_skipped += skipped;
        self.total = self.total_ok + self.total_ko + self.total_skipped;
        self.test_suites.push(suite);
    }

    pub fn is_ok(&self) -> bool {
        self.total_ko == 0
    }

    pub fn pass_rate(&self) -> f64 {
        let ran = self.total_ok + self.total_ko;
        if ran == 0 {
            0.0
        } else {
            (self.total_ok as f64 / ran as f64) * 100.0
        }
    }
}

impl fmt::Display for Tests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | OK: {} | KO: {} | Skipped: {}",
            self.total, self.total_ok, self.total_ko, self.total_skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Failure, TestCase};

    fn suite(cases: Vec<TestCase>) -> TestSuite {
        let mut suite = TestSuite::new("s", cases);
        suite.prepare("s.yml");
        suite.failures = suite.test_cases.iter().map(|c| c.failures.len()).sum();
        suite
    }

    #[test]
    fn test_details_level_from_str() {
        assert_eq!(DetailsLevel::from_str("LOW"), Some(DetailsLevel::Low));
        assert_eq!(DetailsLevel::from_str("high"), Some(DetailsLevel::High));
        assert_eq!(DetailsLevel::from_str("verbose"), None);
        assert!(!DetailsLevel::Low.shows_progress());
    }

    #[test]
    fn test_record_passing_suite() {
        let mut tests = Tests::new();
        tests.record(suite(vec![
            TestCase::new("a", vec![]),
            TestCase::new("b", vec![]),
        ]));

        assert_eq!(tests.total_ok, 2);
        assert_eq!(tests.total_ko, 0);
        assert_eq!(tests.total, 2);
        assert!(tests.is_ok());
    }

    #[test]
    fn test_record_counts_each_case_once() {
        let mut failing = TestCase::new("bad", vec![]);
        failing.failures.push(Failure::new("first"));
        failing.failures.push(Failure::new("It's a failure after 3 attempt(s)"));

        let mut tests = Tests::new();
        tests.record(suite(vec![
            TestCase::new("good", vec![]),
            failing,
            TestCase::new("off", vec![]).skip(),
        ]));

        assert_eq!(tests.total_ok, 1);
        assert_eq!(tests.total_ko, 1);
        assert_eq!(tests.total_skipped, 1);
        assert_eq!(tests.total, 3);
        assert_eq!(tests.test_suites[0].failures, 2);
    }
}
