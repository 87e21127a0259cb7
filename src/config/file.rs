//! Configuration file lookup

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use super::AppConfig;

/// Configuration file locations (in order of precedence)
pub const CONFIG_LOCATIONS: &[&str] = &[
    "./stepwise.yml",
    "./stepwise.yaml",
    "./.stepwise.yml",
    "~/.config/stepwise/config.yml",
];

/// Find configuration file in standard locations
pub fn find() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.is_file())
}

/// Load configuration from the first standard location, defaults otherwise
pub fn load_default() -> Result<AppConfig> {
    match find() {
        Some(path) => {
            debug!("loading config from {}", path.display());
            AppConfig::load(&path)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Expand ~ to home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("./stepwise.yml"), PathBuf::from("./stepwise.yml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_path("~/.config/stepwise/config.yml"),
                home.join(".config/stepwise/config.yml")
            );
        }
    }

    #[test]
    fn test_locations_are_yaml() {
        assert!(CONFIG_LOCATIONS
            .iter()
            .all(|l| l.ends_with(".yml") || l.ends_with(".yaml")));
    }
}
