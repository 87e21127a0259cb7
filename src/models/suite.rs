//! Suite, case and step models
//!
//! These types are decoded from suite files and then carry the run's
//! bookkeeping (failure and error records) back up to the report.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Executor type used when a step does not declare one
pub const DEFAULT_STEP_TYPE: &str = "exec";

/// A single recorded message: either an invocation error or a failed assertion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Failure {
    pub value: String,
}

impl Failure {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// One declarative executor invocation.
///
/// Executor parameters and the reserved keys (`type`, `retry`, `delay`,
/// `timeout`, `assertions`) share the same ordered mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestStep(Mapping);

impl TestStep {
    pub fn new(mapping: Mapping) -> Self {
        Self(mapping)
    }

    /// Build a step from `key: value` YAML text
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Declared executor type, `exec` when absent
    pub fn type_name(&self) -> &str {
        self.get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_STEP_TYPE)
    }

    pub fn retry(&self) -> Option<u64> {
        self.get_u64("retry")
    }

    pub fn delay(&self) -> Option<u64> {
        self.get_u64("delay")
    }

    pub fn timeout(&self) -> Option<u64> {
        self.get_u64("timeout")
    }

    /// Declared assertions, empty when the step has none
    pub fn assertions(&self) -> Vec<String> {
        match self.get("assertions") {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(single)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl JsonSchema for TestStep {
    fn schema_name() -> String {
        "TestStep".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        gen.subschema_for::<serde_json::Map<String, serde_json::Value>>()
    }
}

/// Named, ordered sequence of steps
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct TestCase {
    pub name: String,

    #[serde(default, rename = "steps", alias = "testSteps")]
    pub steps: Vec<TestStep>,

    /// 1 when the case carries a skip marker
    #[serde(
        default,
        rename(serialize = "skipped", deserialize = "skip"),
        alias = "skipped",
        deserialize_with = "skip_flag"
    )]
    #[schemars(with = "bool")]
    pub skipped: u32,

    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    #[schemars(skip)]
    pub failures: Vec<Failure>,

    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    #[schemars(skip)]
    pub errors: Vec<Failure>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, steps: Vec<TestStep>) -> Self {
        Self {
            name: name.into(),
            steps,
            ..Default::default()
        }
    }

    pub fn skip(mut self) -> Self {
        self.skipped = 1;
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped > 0
    }

    /// Record count used for stop-on-first-failure checks
    pub fn record_count(&self) -> usize {
        self.failures.len() + self.errors.len()
    }

    pub fn is_failed(&self) -> bool {
        self.record_count() > 0
    }
}

/// Accepts `skip: true` as well as the integer form `skipped: 1`
fn skip_flag<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => u32::from(b),
        Flag::Int(n) => u32::from(n > 0),
    })
}

/// Named collection of test cases loaded from one file
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct TestSuite {
    pub name: String,

    /// Path the suite was loaded from
    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub package: String,

    #[serde(default, rename = "testcases")]
    pub test_cases: Vec<TestCase>,

    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub total: usize,

    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub failures: usize,

    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub errors: usize,

    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub skipped: usize,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, test_cases: Vec<TestCase>) -> Self {
        Self {
            name: name.into(),
            test_cases,
            ..Default::default()
        }
    }

    /// Stamp the source path and precompute case and skip counts
    pub fn prepare(&mut self, package: impl Into<String>) {
        self.package = package.into();
        self.name = format!("{} [{}]", self.name, self.package);
        self.total = self.test_cases.len();
        self.skipped = self.test_cases.iter().filter(|tc| tc.is_skipped()).count();
    }

    pub fn step_count(&self) -> usize {
        self.test_cases.iter().map(|tc| tc.steps.len()).sum()
    }

    /// Cases holding at least one failure or error record
    pub fn failed_cases(&self) -> usize {
        self.test_cases.iter().filter(|tc| tc.is_failed()).count()
    }

    pub fn passed(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} cases, {} failures, {} errors, {} skipped)",
            self.name, self.total, self.failures, self.errors, self.skipped
        )
    }
}
