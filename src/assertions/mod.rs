//! Assertion checking
//!
//! Assertions are strings of the form `<dotted-path> <Predicate> <expected...>`,
//! e.g. `result.statusCode ShouldEqual 200`, evaluated against a flattened
//! [`ExecutorResult`].

mod predicates;

pub use predicates::Predicate;

use thiserror::Error;

use crate::models::{ExecutorResult, Failure};

/// Assertion expressions that cannot be evaluated
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CheckError {
    #[error("Invalid assertion '{0}': expected '<path> <Predicate> [expected]'")]
    Malformed(String),

    #[error("Unknown assertion predicate '{predicate}' in '{assertion}'")]
    UnknownPredicate {
        predicate: String,
        assertion: String,
    },

    #[error("Assertion '{0}' is missing its expected value")]
    MissingExpected(String),
}

/// Outcome of checking one executor result
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckOutcome {
    pub is_ok: bool,
    pub errors: Vec<Failure>,
    pub failures: Vec<Failure>,
}

/// Evaluates a step's assertions against an executor result
pub trait CheckEvaluator: Send + Sync {
    /// `defaults` apply only when `declared` is empty
    fn evaluate(
        &self,
        result: &ExecutorResult,
        declared: &[String],
        defaults: Option<&[String]>,
    ) -> CheckOutcome;
}

/// A parsed assertion expression
#[derive(Clone, Debug, PartialEq)]
pub struct Assertion {
    pub path: String,
    pub predicate: Predicate,
    pub expected: String,
}

impl Assertion {
    pub fn parse(expression: &str) -> Result<Self, CheckError> {
        let mut parts = expression.split_whitespace();
        let (Some(path), Some(name)) = (parts.next(), parts.next()) else {
            return Err(CheckError::Malformed(expression.to_string()));
        };
        let predicate = Predicate::from_name(name).ok_or_else(|| CheckError::UnknownPredicate {
            predicate: name.to_string(),
            assertion: expression.to_string(),
        })?;
        let expected = parts.collect::<Vec<_>>().join(" ");
        if predicate.expects_value() && expected.is_empty() {
            return Err(CheckError::MissingExpected(expression.to_string()));
        }

        Ok(Self {
            path: path.to_string(),
            predicate,
            expected,
        })
    }
}

/// Checker for the built-in predicate vocabulary
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultChecker;

impl CheckEvaluator for DefaultChecker {
    fn evaluate(
        &self,
        result: &ExecutorResult,
        declared: &[String],
        defaults: Option<&[String]>,
    ) -> CheckOutcome {
        let assertions = match defaults {
            Some(defaults) if declared.is_empty() => defaults,
            _ => declared,
        };

        let mut outcome = CheckOutcome::default();
        for expression in assertions {
            let assertion = match Assertion::parse(expression) {
                Ok(assertion) => assertion,
                Err(err) => {
                    outcome.errors.push(Failure::new(err.to_string()));
                    continue;
                }
            };

            if let Err(mismatch) = assertion
                .predicate
                .check(result.get(&assertion.path), &assertion.expected)
            {
                outcome.failures.push(Failure::new(format!(
                    "Assertion \"{expression}\" failed. {}: {mismatch}",
                    assertion.path
                )));
            }
        }

        outcome.is_ok = outcome.errors.is_empty() && outcome.failures.is_empty();
        outcome
    }
}
