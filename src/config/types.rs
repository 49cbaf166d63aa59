//! Configuration types and structures.

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::types::TargetIndexPolicy;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub reorder: ReorderConfig,

    #[serde(default)]
    pub boards: BoardsConfig,
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.reorder.max_attempts == 0 {
            return Err(anyhow!("reorder.max_attempts must be at least 1"));
        }
        if self.boards.default_columns.is_empty() {
            return Err(anyhow!("boards.default_columns must name at least one column"));
        }
        if let Some(blank) = self
            .boards
            .default_columns
            .iter()
            .position(|name| name.trim().is_empty())
        {
            return Err(anyhow!("boards.default_columns[{}] is empty", blank));
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How long a connection waits for another writer before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("kanban-order/board.db")
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Settings for order-changing transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderConfig {
    /// Attempts per operation when the database reports a conflict.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit between attempts; attempt `n` waits `n * retry_backoff_ms`.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// What to do with a cross-list target index past the end of the list.
    #[serde(default)]
    pub target_index_policy: TargetIndexPolicy,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            target_index_policy: TargetIndexPolicy::default(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    25
}

/// Settings for new boards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardsConfig {
    /// Columns created with every new board, in order.
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
        }
    }
}

fn default_columns() -> Vec<String> {
    vec![
        "To Do".to_string(),
        "In Progress".to_string(),
        "Done".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.reorder.max_attempts, 3);
        assert_eq!(config.reorder.retry_backoff_ms, 25);
        assert_eq!(config.reorder.target_index_policy, TargetIndexPolicy::Clamp);
        assert_eq!(config.boards.default_columns, vec!["To Do", "In Progress", "Done"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "reorder:\n  target_index_policy: reject\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.reorder.target_index_policy, TargetIndexPolicy::Reject);
        assert_eq!(config.reorder.max_attempts, 3);
        assert_eq!(config.server.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn validate_rejects_zero_attempts_and_blank_columns() {
        let mut config = Config::default();
        config.reorder.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.boards.default_columns = vec!["Backlog".to_string(), "  ".to_string()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.boards.default_columns.clear();
        assert!(config.validate().is_err());
    }
}
