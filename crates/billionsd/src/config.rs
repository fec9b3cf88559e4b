//! Configuration management for billionsd.
//!
//! Loads settings from /etc/billions/config.toml or uses defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/billions/config.toml";

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7870".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// User store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(billions_common::store::sqlite::DEFAULT_DB_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Leaderboard paging limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Rows returned when the request has no limit
    #[serde(default = "default_leaderboard_limit")]
    pub default_limit: usize,

    /// Hard cap on requested rows
    #[serde(default = "default_leaderboard_max")]
    pub max_limit: usize,
}

fn default_leaderboard_limit() -> usize {
    100
}

fn default_leaderboard_max() -> usize {
    500
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: default_leaderboard_limit(),
            max_limit: default_leaderboard_max(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl Config {
    /// Load config from the given path (or the system path), falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Config::default();
        }

        Self::load_from_path(path).unwrap_or_else(|e| {
            warn!("Invalid config at {}, using defaults: {:#}", path.display(), e);
            Config::default()
        })
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:7870");
        assert_eq!(config.leaderboard.default_limit, 100);
        assert_eq!(config.leaderboard.max_limit, 500);
        assert_eq!(config.storage.db_path, PathBuf::from("/var/lib/billions/billions.db"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [leaderboard]
            max_limit = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.leaderboard.max_limit, 50);
        assert_eq!(config.leaderboard.default_limit, 100);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml").as_path()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();
        assert_eq!(Config::load(Some(file.path())), Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_addr = \"0.0.0.0:9000\"").unwrap();
        writeln!(file, "[storage]\ndb_path = \"/tmp/billions-test.db\"").unwrap();
        let config = Config::load(Some(file.path()));
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/billions-test.db"));
    }
}
