//! Configuration management for pricewatch.
//!
//! Configuration is read from `~/.config/pricewatch/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::checker::CheckerConfig;
use crate::loader::LoaderConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loader: LoaderConfig,
    pub checker: CheckerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database path; the platform data directory when unset
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating it with defaults if missing.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/pricewatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pricewatch").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# pricewatch configuration

[loader]
# How pages are loaded: "chrome" renders JavaScript, "http" fetches raw HTML
kind = "chrome"

# Run browser in headless mode (no visible window)
headless = true

# Page load timeout in seconds
timeout_secs = 30

# Wait after a product page loads before reading the price (milliseconds)
product_settle_ms = 5000

# Wait after a search page loads before reading results (milliseconds)
search_settle_ms = 8000

# user_agent = "Mozilla/5.0 ..."

[checker]
# Time between price checks: "30m", "6h", "1d"
interval = "6h"

# Check all products as soon as `pricewatch watch` starts
check_on_start = true

[store]
# Database location (defaults to the platform data directory)
# path = "/path/to/pricewatch.db"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoaderKind;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        assert_eq!(config.loader.kind, LoaderKind::Chrome);
        assert_eq!(config.loader.product_settle_ms, 5000);
        assert_eq!(config.checker.interval, "6h");
        assert!(config.checker.check_on_start);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[checker]
interval = "30m"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.checker.interval_secs().unwrap(), 1800);
        assert!(config.checker.check_on_start);
        assert_eq!(config.loader.timeout_secs, 30);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.checker.interval, "6h");

        // Second load reads the file that was just written
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.loader.search_settle_ms, 8000);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[loader]\nkind = \"carrier-pigeon\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
