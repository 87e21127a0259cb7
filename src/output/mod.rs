//! Output module
//!
//! Progress display while suites run and the final run report.

mod formatter;
mod progress;

pub use formatter::{suite_status_line, OutputFormat, ReportFormatter};
pub use progress::{right_pad, ProgressRegistry, PACKAGE_WIDTH};
