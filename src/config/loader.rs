//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "KANBAN_ORDER_CONFIG_PATH";
pub const ENV_DB_PATH: &str = "KANBAN_ORDER_DB_PATH";
pub const ENV_MAX_ATTEMPTS: &str = "KANBAN_ORDER_MAX_ATTEMPTS";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// `$CWD/kanban-order`
    pub project_dir: Option<PathBuf>,
    /// `~/.kanban-order`
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    pub fn discover() -> Self {
        Self {
            project_dir: Some(PathBuf::from("kanban-order")),
            user_dir: dirs::home_dir().map(|home| home.join(".kanban-order")),
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed, with their tier.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit file, skipping the file tiers.
    ///
    /// Environment overrides still apply on top.
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::load_explicit(ConfigPaths::discover(), path, |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and environment lookup.
    pub fn load_with(paths: ConfigPaths, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(explicit) = env(ENV_CONFIG_PATH) {
            return Self::load_explicit(paths, Path::new(&explicit), env);
        }

        let mut layers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        let tiers = [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ];
        for (tier, dir) in tiers {
            let Some(dir) = dir else { continue };
            let file = dir.join(CONFIG_FILE);
            if let Some(layer) = read_layer(&file, tier) {
                layers.push(layer);
                sources.push((tier, file));
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(layers))
            .context("Invalid configuration after merging tiers")?;
        apply_env_overrides(&mut config, &env)?;
        config.validate()?;

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    fn load_explicit(
        paths: ConfigPaths,
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Config::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        apply_env_overrides(&mut config, &env)?;
        config.validate()?;

        Ok(Self {
            paths,
            config,
            sources: vec![(ConfigTier::Project, path.to_path_buf())],
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Files that were merged, lowest priority first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one YAML tier. Unreadable or malformed files are skipped with a warning.
fn read_layer(file: &Path, tier: ConfigTier) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %file.display(), %tier, error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(path = %file.display(), %tier, "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(path = %file.display(), %tier, error = %e, "Skipping malformed config file");
            None
        }
    }
}

fn apply_env_overrides(config: &mut Config, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(db_path) = env(ENV_DB_PATH) {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(attempts) = env(ENV_MAX_ATTEMPTS) {
        config.reorder.max_attempts = attempts
            .trim()
            .parse()
            .with_context(|| format!("{} must be a positive integer, got '{}'", ENV_MAX_ATTEMPTS, attempts))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetIndexPolicy;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(dir: &Path, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with(paths, no_env).unwrap();
        assert_eq!(loader.config().reorder.max_attempts, 3);
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban-order");
        let user_dir = temp.path().join("user");

        write_config(
            &project_dir,
            "reorder:\n  max_attempts: 5\n  retry_backoff_ms: 10\n",
        );
        write_config(
            &user_dir,
            "reorder:\n  max_attempts: 7\n  target_index_policy: reject\n",
        );

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));
        let loader = ConfigLoader::load_with(paths, no_env).unwrap();
        let reorder = &loader.config().reorder;

        assert_eq!(reorder.max_attempts, 7);
        assert_eq!(reorder.retry_backoff_ms, 10);
        assert_eq!(reorder.target_index_policy, TargetIndexPolicy::Reject);
        assert_eq!(loader.sources().len(), 2);
        assert_eq!(loader.sources()[0].0, ConfigTier::Project);
    }

    #[test]
    fn test_malformed_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban-order");
        write_config(&project_dir, "reorder: [unclosed\n");

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with(paths, no_env).unwrap();
        assert_eq!(loader.config().reorder.max_attempts, 3);
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn test_env_overrides_files() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban-order");
        write_config(&project_dir, "server:\n  db_path: from-file.db\n");

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let env = env_from(&[(ENV_DB_PATH, "from-env.db"), (ENV_MAX_ATTEMPTS, "9")]);
        let loader = ConfigLoader::load_with(paths, env).unwrap();

        assert_eq!(loader.config().server.db_path, PathBuf::from("from-env.db"));
        assert_eq!(loader.config().reorder.max_attempts, 9);
    }

    #[test]
    fn test_explicit_config_path_replaces_tiers() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban-order");
        write_config(&project_dir, "reorder:\n  max_attempts: 5\n");

        let explicit = temp.path().join("explicit.yaml");
        std::fs::write(&explicit, "boards:\n  default_columns: [Backlog, Done]\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let explicit_str = explicit.to_string_lossy().to_string();
        let env = env_from(&[(ENV_CONFIG_PATH, explicit_str.as_str())]);
        let loader = ConfigLoader::load_with(paths, env).unwrap();

        assert_eq!(loader.config().reorder.max_attempts, 3);
        assert_eq!(loader.config().boards.default_columns, vec!["Backlog", "Done"]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(Some(temp.path().join("none")), None);
        let env = env_from(&[(ENV_MAX_ATTEMPTS, "lots")]);
        assert!(ConfigLoader::load_with(paths.clone(), env).is_err());

        let env = env_from(&[(ENV_MAX_ATTEMPTS, "0")]);
        assert!(ConfigLoader::load_with(paths, env).is_err());
    }
}
