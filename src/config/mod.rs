//! Configuration management for strand.
//!
//! Configuration is read from `~/.config/strand/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::Sort;
use crate::timeline::{SkipPolicy, DEFAULT_PAGE_LIMIT};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeline: TimelineConfig,
    pub ingestion: IngestionConfig,
    pub fetcher: FetcherConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Notes requested per page (default: 32)
    pub limit: usize,
    /// Initial ordering when none is requested
    pub sort: Sort,
    /// How the page position advances after replies are filtered out
    pub skip_policy: SkipPolicy,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            sort: Sort::Latest,
            skip_policy: SkipPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Actors followed on first run when the follow list is empty
    pub default_followed: Vec<String>,
    /// Outbox pages walked per actor beyond the collection itself
    pub max_outbox_pages: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            default_followed: Vec::new(),
            max_outbox_pages: crate::store::content::DEFAULT_MAX_OUTBOX_PAGES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("strand/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/strand/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("strand").join("config.toml"))
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

    fn default_config_content() -> String {
        r##"# strand configuration

[timeline]
# Notes requested from the store per page
limit = 32

# Initial ordering: "latest", "oldest" or "random"
sort = "latest"

# How the page position advances after replies are filtered out of a page:
# "emitted"  - by the number of notes shown (replies excluded)
# "returned" - by the number of notes the store returned
skip_policy = "emitted"

[ingestion]
# Actors to follow when the follow list is empty
default_followed = []

# Outbox pages to walk per actor
max_outbox_pages = 2

[fetcher]
# Request timeout in seconds
timeout_secs = 10
"##
        .to_string()
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

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.timeline.limit, 32);
        assert_eq!(config.timeline.sort, Sort::Latest);
        assert_eq!(config.timeline.skip_policy, SkipPolicy::Emitted);
        assert_eq!(config.ingestion.max_outbox_pages, 2);
        assert_eq!(config.fetcher.timeout_secs, 10);
        assert!(config.fetcher.user_agent.starts_with("strand/"));
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[timeline]
sort = "oldest"
skip_policy = "returned"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.timeline.sort, Sort::Oldest);
        assert_eq!(config.timeline.skip_policy, SkipPolicy::Returned);
        assert_eq!(config.timeline.limit, 32);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.timeline.limit, 32);
        assert!(config.ingestion.default_followed.is_empty());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strand").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.timeline.limit, 32);

        fs::write(&path, "[timeline]\nlimit = 5\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timeline.limit, 5);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[timeline\nlimit = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
