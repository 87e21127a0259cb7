//! Run-scoped aliases
//!
//! Built once from `name:value` strings before any suite runs, read-only after.

use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aliases {
    values: BTreeMap<String, String>,
}

impl Aliases {
    /// Parse `name:value` entries; everything after the first `:` is the value.
    /// Entries without a colon are skipped.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut values = BTreeMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            match entry.split_once(':') {
                Some((name, value)) => {
                    values.insert(name.to_string(), value.to_string());
                }
                None => debug!(alias = entry, "ignoring alias without ':'"),
            }
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Replace every `{{name}}` with its alias value.
    ///
    /// One left-to-right pass: substituted values are never scanned again and
    /// unknown references stay as written.
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let open = &rest[start + 2..];
            let Some(end) = open.find("}}") else {
                rest = &rest[start..];
                break;
            };
            match self.values.get(&open[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &open[end + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = open;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_malformed() {
        let aliases = Aliases::parse(&["HOST:example.com", "bad-entry"]);
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.get("HOST"), Some("example.com"));
        assert_eq!(aliases.get("bad-entry"), None);
    }

    #[test]
    fn test_value_keeps_colons() {
        let aliases = Aliases::parse(&["API:http://localhost:8080/v1"]);
        assert_eq!(aliases.get("API"), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_expand() {
        let aliases = Aliases::parse(&["HOST:example.com", "PORT:8080"]);
        assert_eq!(
            aliases.expand("http://{{HOST}}:{{PORT}}/health"),
            "http://example.com:8080/health"
        );
        assert_eq!(aliases.expand("{{UNKNOWN}}"), "{{UNKNOWN}}");
        assert_eq!(aliases.expand("plain"), "plain");
        assert_eq!(aliases.expand("open {{HOST"), "open {{HOST");
    }

    #[test]
    fn test_expanded_values_are_not_rescanned() {
        let aliases = Aliases::parse(&["A:{{B}}", "B:x", "Z:{{A}}"]);
        assert_eq!(aliases.expand("{{A}}"), "{{B}}");
        assert_eq!(aliases.expand("{{Z}}-{{B}}"), "{{A}}-x");
        assert_eq!(aliases.expand("{{ {{B}}"), "{{ x");
    }
}
