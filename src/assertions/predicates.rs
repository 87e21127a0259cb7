//! Assertion predicates

use serde_json::Value;

use crate::models::value_to_string;

/// Predicate vocabulary understood by the default checker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
    ShouldEqual,
    ShouldNotEqual,
    ShouldContainSubstring,
    ShouldNotContainSubstring,
    ShouldStartWith,
    ShouldEndWith,
    ShouldBeEmpty,
    ShouldNotBeEmpty,
    ShouldExist,
    ShouldNotExist,
    ShouldBeTrue,
    ShouldBeFalse,
    ShouldBeGreaterThan,
    ShouldBeGreaterThanOrEqualTo,
    ShouldBeLessThan,
    ShouldBeLessThanOrEqualTo,
}

impl Predicate {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ShouldEqual" => Predicate::ShouldEqual,
            "ShouldNotEqual" => Predicate::ShouldNotEqual,
            "ShouldContainSubstring" => Predicate::ShouldContainSubstring,
            "ShouldNotContainSubstring" => Predicate::ShouldNotContainSubstring,
            "ShouldStartWith" => Predicate::ShouldStartWith,
            "ShouldEndWith" => Predicate::ShouldEndWith,
            "ShouldBeEmpty" => Predicate::ShouldBeEmpty,
            "ShouldNotBeEmpty" => Predicate::ShouldNotBeEmpty,
            "ShouldExist" => Predicate::ShouldExist,
            "ShouldNotExist" => Predicate::ShouldNotExist,
            "ShouldBeTrue" => Predicate::ShouldBeTrue,
            "ShouldBeFalse" => Predicate::ShouldBeFalse,
            "ShouldBeGreaterThan" => Predicate::ShouldBeGreaterThan,
            "ShouldBeGreaterThanOrEqualTo" => Predicate::ShouldBeGreaterThanOrEqualTo,
            "ShouldBeLessThan" => Predicate::ShouldBeLessThan,
            "ShouldBeLessThanOrEqualTo" => Predicate::ShouldBeLessThanOrEqualTo,
            _ => return None,
        })
    }

    /// Whether the predicate needs an expected literal
    pub fn expects_value(self) -> bool {
        !matches!(
            self,
            Predicate::ShouldBeEmpty
                | Predicate::ShouldNotBeEmpty
                | Predicate::ShouldExist
                | Predicate::ShouldNotExist
                | Predicate::ShouldBeTrue
                | Predicate::ShouldBeFalse
        )
    }

    /// Check `actual` (absent when the key is missing) against `expected`.
    ///
    /// Returns a mismatch description on failure.
    pub fn check(self, actual: Option<&Value>, expected: &str) -> Result<(), String> {
        match self {
            Predicate::ShouldExist => {
                return actual.map(|_| ()).ok_or_else(|| "key does not exist".to_string());
            }
            Predicate::ShouldNotExist => {
                return match actual {
                    None => Ok(()),
                    Some(v) => Err(format!("key exists with value '{}'", value_to_string(v))),
                };
            }
            _ => {}
        }

        let Some(actual) = actual else {
            return Err("key not found in result".to_string());
        };
        let text = value_to_string(actual);

        let ok = match self {
            Predicate::ShouldEqual => loosely_equal(&text, expected),
            Predicate::ShouldNotEqual => !loosely_equal(&text, expected),
            Predicate::ShouldContainSubstring => text.contains(expected),
            Predicate::ShouldNotContainSubstring => !text.contains(expected),
            Predicate::ShouldStartWith => text.starts_with(expected),
            Predicate::ShouldEndWith => text.ends_with(expected),
            Predicate::ShouldBeEmpty => is_empty(actual),
            Predicate::ShouldNotBeEmpty => !is_empty(actual),
            Predicate::ShouldBeTrue => text.eq_ignore_ascii_case("true"),
            Predicate::ShouldBeFalse => text.eq_ignore_ascii_case("false"),
            Predicate::ShouldBeGreaterThan
            | Predicate::ShouldBeGreaterThanOrEqualTo
            | Predicate::ShouldBeLessThan
            | Predicate::ShouldBeLessThanOrEqualTo => {
                let (Ok(lhs), Ok(rhs)) = (text.trim().parse::<f64>(), expected.trim().parse::<f64>())
                else {
                    return Err(format!("cannot compare '{text}' and '{expected}' as numbers"));
                };
                match self {
                    Predicate::ShouldBeGreaterThan => lhs > rhs,
                    Predicate::ShouldBeGreaterThanOrEqualTo => lhs >= rhs,
                    Predicate::ShouldBeLessThan => lhs < rhs,
                    _ => lhs <= rhs,
                }
            }
            Predicate::ShouldExist | Predicate::ShouldNotExist => true,
        };

        if ok {
            Ok(())
        } else if self.expects_value() {
            Err(format!("got '{text}', expected {self:?} '{expected}'"))
        } else {
            Err(format!("got '{text}'"))
        }
    }
}

/// String equality, with numeric comparison when both sides are numbers
fn loosely_equal(actual: &str, expected: &str) -> bool {
    if actual == expected {
        return true;
    }
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_is_numeric_aware() {
        assert!(Predicate::ShouldEqual.check(Some(&json!(200)), "200").is_ok());
        assert!(Predicate::ShouldEqual.check(Some(&json!(200.0)), "200").is_ok());
        assert!(Predicate::ShouldEqual.check(Some(&json!(404)), "200").is_err());
        assert!(Predicate::ShouldNotEqual.check(Some(&json!("a")), "b").is_ok());
    }

    #[test]
    fn test_existence() {
        assert!(Predicate::ShouldNotExist.check(None, "").is_ok());
        assert!(Predicate::ShouldNotExist.check(Some(&json!("x")), "").is_err());
        assert!(Predicate::ShouldExist.check(None, "").is_err());
        assert!(Predicate::ShouldEqual.check(None, "1").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Predicate::ShouldBeLessThan.check(Some(&json!(0.2)), "1").is_ok());
        assert!(Predicate::ShouldBeGreaterThanOrEqualTo
            .check(Some(&json!(3)), "3")
            .is_ok());
        assert!(Predicate::ShouldBeGreaterThan
            .check(Some(&json!("abc")), "1")
            .is_err());
    }

    #[test]
    fn test_strings() {
        let body = json!("hello world");
        assert!(Predicate::ShouldContainSubstring.check(Some(&body), "lo wo").is_ok());
        assert!(Predicate::ShouldStartWith.check(Some(&body), "hello").is_ok());
        assert!(Predicate::ShouldEndWith.check(Some(&body), "hello").is_err());
        assert!(Predicate::ShouldBeEmpty.check(Some(&json!("")), "").is_ok());
        assert!(Predicate::ShouldBeTrue.check(Some(&json!(true)), "").is_ok());
    }
}
