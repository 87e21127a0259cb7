//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::AppConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STEPWISE";

/// Overrides read from `STEPWISE_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// STEPWISE_PARALLEL
    pub parallel: Option<usize>,
    /// STEPWISE_DETAILS
    pub details: Option<String>,
    /// STEPWISE_TIMEOUT
    pub default_timeout_secs: Option<u64>,
    /// STEPWISE_DELAY_FIRST_RETRY
    pub delay_first_retry: Option<bool>,
    /// STEPWISE_ALIASES, comma separated
    pub aliases: Option<Vec<String>>,
    /// STEPWISE_FORMAT
    pub format: Option<String>,
    /// STEPWISE_LOG_LEVEL
    pub log_level: Option<String>,
    /// STEPWISE_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            parallel: get_env_parse("PARALLEL"),
            details: get_env("DETAILS"),
            default_timeout_secs: get_env_parse("TIMEOUT"),
            delay_first_retry: get_env_bool("DELAY_FIRST_RETRY"),
            aliases: get_env("ALIASES").map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }),
            format: get_env("FORMAT"),
            log_level: get_env("LOG_LEVEL"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.parallel.is_some()
            || self.details.is_some()
            || self.default_timeout_secs.is_some()
            || self.delay_first_retry.is_some()
            || self.aliases.is_some()
            || self.format.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }

    /// Override the config's values with the variables that are set
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }
        if let Some(details) = &self.details {
            config.details = details.clone();
        }
        if let Some(timeout) = self.default_timeout_secs {
            config.default_timeout_secs = timeout;
        }
        if let Some(delay) = self.delay_first_retry {
            config.delay_first_retry = delay;
        }
        if let Some(aliases) = &self.aliases {
            config.aliases.extend(aliases.iter().cloned());
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables in tests
#[cfg(test)]
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }
        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
