//! Report formatters
//!
//! Provides table, JSON, YAML and CSV renderings of a run.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use super::progress::{right_pad, PACKAGE_WIDTH};
use crate::models::{DetailsLevel, TestSuite, Tests};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Yaml,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    /// Format implied by a report file's extension, table text otherwise
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => OutputFormat::JsonPretty,
            Some("yml") | Some("yaml") => OutputFormat::Yaml,
            Some("csv") => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

/// Terminal line emitted when a suite finishes
pub fn suite_status_line(suite: &TestSuite, elapsed: Duration, details: DetailsLevel) -> String {
    let mark = if suite.passed() { "✅" } else { "❌" };
    let mut line = format!("{mark} {}", right_pad(&suite.package, PACKAGE_WIDTH));
    if details == DetailsLevel::Low {
        line.push_str(&format!("{elapsed:?}"));
    }
    line
}

#[derive(Serialize)]
struct SuiteRow<'a> {
    suite: &'a str,
    package: &'a str,
    total: usize,
    failures: usize,
    errors: usize,
    skipped: usize,
    status: &'a str,
}

/// Run report formatter
pub struct ReportFormatter {
    format: OutputFormat,
    details: DetailsLevel,
    colorize: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            details: DetailsLevel::default(),
            colorize: true,
        }
    }

    pub fn with_details(mut self, details: DetailsLevel) -> Self {
        self.details = details;
        self
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self, tests: &Tests) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Table => self.format_table(tests),
            OutputFormat::Json => serde_json::to_string(tests).context("Failed to render JSON")?,
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(tests).context("Failed to render JSON")?
            }
            OutputFormat::Yaml => serde_yaml::to_string(tests).context("Failed to render YAML")?,
            OutputFormat::Csv => self.format_csv(tests)?,
        })
    }

    /// Write the report to `path`, format picked from the extension
    pub fn write_report(tests: &Tests, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = ReportFormatter::new(OutputFormat::from_path(path))
            .with_details(DetailsLevel::High)
            .no_color()
            .format(tests)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.colorize {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn format_table(&self, tests: &Tests) -> String {
        let mut output = String::new();

        output.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        for suite in &tests.test_suites {
            let mark = if suite.passed() {
                self.paint("✓", "32")
            } else {
                self.paint("✗", "31")
            };
            output.push_str(&format!(
                "{mark} {} {:3} cases | {:3} failures | {:3} errors | {:3} skipped\n",
                right_pad(&suite.package, PACKAGE_WIDTH),
                suite.total,
                suite.failures,
                suite.errors,
                suite.skipped
            ));

            if self.details == DetailsLevel::High {
                for case in suite.test_cases.iter().filter(|c| c.is_failed()) {
                    output.push_str(&format!("    ✗ {}\n", case.name));
                    for error in &case.errors {
                        output.push_str(&format!("        error: {error}\n"));
                    }
                    for failure in &case.failures {
                        output.push_str(&format!("        failure: {failure}\n"));
                    }
                }
            }
        }
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        let ko = if tests.total_ko > 0 {
            self.paint(&tests.total_ko.to_string(), "31")
        } else {
            tests.total_ko.to_string()
        };
        output.push_str(&format!(
            "Total: {} | OK: {} | KO: {} | Skipped: {}\n",
            tests.total,
            self.paint(&tests.total_ok.to_string(), "32"),
            ko,
            tests.total_skipped
        ));
        output.push_str(&format!(
            "Pass Rate: {:.1}% | Duration: {}ms\n",
            tests.pass_rate(),
            tests.duration_ms
        ));
        output
    }

    fn format_csv(&self, tests: &Tests) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for suite in &tests.test_suites {
            writer.serialize(SuiteRow {
                suite: &suite.name,
                package: &suite.package,
                total: suite.total,
                failures: suite.failures,
                errors: suite.errors,
                skipped: suite.skipped,
                status: if suite.passed() { "ok" } else { "ko" },
            })?;
        }
        let bytes = writer.into_inner().context("Failed to flush CSV")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }
}
