//! Flattened executor results
//!
//! Executors produce structured values; assertions look them up by dotted
//! path (`result.statusCode`, `result.bodyjson.items.0.id`).

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Root every flattened key hangs off
pub const RESULT_ROOT: &str = "result";

/// Array lengths are exposed under `<path>.__len__`
pub const LEN_SUFFIX: &str = "__len__";

/// Flattened key→value view of an executor's output.
///
/// Keys are stored lower-cased; lookups are case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExecutorResult {
    values: BTreeMap<String, Value>,
}

impl ExecutorResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten any serializable value under the `result.` root
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        let mut result = Self::new();
        result.flatten(RESULT_ROOT, &value);
        Ok(result)
    }

    pub fn insert(&mut self, path: impl AsRef<str>, value: impl Into<Value>) {
        self.values
            .insert(path.as_ref().to_lowercase(), value.into());
    }

    /// Builder form of [`insert`](Self::insert)
    #[cfg(test)]
    pub fn with(mut self, path: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(&path.to_lowercase())
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    fn flatten(&mut self, prefix: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Object(map) if map.is_empty() => self.insert(prefix, value.clone()),
            Value::Object(map) => {
                for (key, child) in map {
                    self.flatten(&format!("{prefix}.{key}"), child);
                }
            }
            Value::Array(items) => {
                self.insert(format!("{prefix}.{LEN_SUFFIX}"), items.len());
                for (index, child) in items.iter().enumerate() {
                    self.flatten(&format!("{prefix}.{index}"), child);
                }
            }
            scalar => self.insert(prefix, scalar.clone()),
        }
    }
}

/// Render a leaf the way assertions compare it: strings unquoted, the rest as JSON
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        #[serde(rename = "statusCode")]
        status_code: u16,
        body: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        err: Option<String>,
        bodyjson: Value,
    }

    #[test]
    fn test_flatten_nested() {
        let sample = Sample {
            status_code: 200,
            body: "ok".into(),
            err: None,
            bodyjson: json!({"items": [{"id": 7}, {"id": 9}], "meta": {}}),
        };
        let result = ExecutorResult::from_serializable(&sample).unwrap();

        assert_eq!(result.get("result.statusCode"), Some(&json!(200)));
        assert_eq!(result.get("result.statuscode"), Some(&json!(200)));
        assert_eq!(result.get("result.body"), Some(&json!("ok")));
        assert_eq!(result.get("result.bodyjson.items.__len__"), Some(&json!(2)));
        assert_eq!(result.get("result.bodyjson.items.1.id"), Some(&json!(9)));
        assert_eq!(result.get("result.bodyjson.meta"), Some(&json!({})));
        assert!(!result.contains("result.err"));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("abc")), "abc");
        assert_eq!(value_to_string(&json!(404)), "404");
        assert_eq!(value_to_string(&json!(true)), "true");
    }
}
