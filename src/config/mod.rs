//! Configuration module
//!
//! Settings come from a config file, then `STEPWISE_*` environment
//! variables, then command-line flags, each layer overriding the previous.

mod env;
mod file;

pub use env::EnvConfig;
pub use file::{expand_path, load_default};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::{RunSettings, DEFAULT_TIMEOUT_SECS};
use crate::models::DetailsLevel;
use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Suites executing at once
    pub parallel: usize,

    /// low, medium or high
    pub details: String,

    /// Per-attempt deadline for steps without `timeout`
    pub default_timeout_secs: u64,

    /// Also wait `delay` before the first retry
    pub delay_first_retry: bool,

    /// `name:value` entries, merged before the command-line ones
    pub aliases: Vec<String>,

    /// Report format printed at the end of a run
    pub format: String,

    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            parallel: 1,
            details: DetailsLevel::default().to_string(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_first_retry: false,
            aliases: Vec::new(),
            format: "table".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    #[cfg(test)]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.parallel == 0 {
            anyhow::bail!("parallel must be at least 1");
        }
        if DetailsLevel::from_str(&self.details).is_none() {
            anyhow::bail!(
                "Unknown details level '{}'. Valid: low, medium, high",
                self.details
            );
        }
        if OutputFormat::from_str(&self.format).is_none() {
            anyhow::bail!(
                "Unknown format '{}'. Valid: table, json, json-pretty, yaml, csv",
                self.format
            );
        }
        if LogLevel::from_str(&self.log_level).is_none() {
            anyhow::bail!("Unknown log level '{}'", self.log_level);
        }
        Ok(())
    }

    pub fn details_level(&self) -> DetailsLevel {
        DetailsLevel::from_str(&self.details).unwrap_or_default()
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.format).unwrap_or(OutputFormat::Table)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.log_level).unwrap_or(LogLevel::Warn)
    }

    /// Engine settings for a run
    pub fn run_settings(&self) -> RunSettings {
        RunSettings::default()
            .with_parallel(self.parallel)
            .with_details(self.details_level())
            .with_default_timeout(self.default_timeout_secs)
            .with_delay_first_retry(self.delay_first_retry)
    }
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
