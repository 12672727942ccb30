//! Configuration loading and validation.
//!
//! Sources are merged in order: built-in defaults, the user's
//! `config.toml`, an explicit `--config` file, then `SW_*` environment
//! variables (for example `SW_DATABASE_PATH`).

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tasks remembered by `sw history` unless configured otherwise.
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] Box<figment::Error>),
    #[error("database_path must not be empty")]
    EmptyDatabasePath,
    #[error("database_path {} is a directory", .0.display())]
    DatabasePathIsDirectory(PathBuf),
    #[error("history_limit must be at least 1")]
    EmptyHistory,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The store file. A leading `~/` expands to the home directory.
    pub database_path: PathBuf,
    /// How many recently started tasks to keep.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("data.dat"),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Config {
    /// Loads configuration, optionally layering a specific file.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("SW_"));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.resolve()
    }

    /// Expands `~/` in the database path and checks the values are usable.
    fn resolve(mut self) -> Result<Self, ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if let Ok(rest) = self.database_path.strip_prefix("~") {
            if let Some(home) = dirs::home_dir() {
                self.database_path = home.join(rest);
            }
        }
        if self.database_path.is_dir() {
            return Err(ConfigError::DatabasePathIsDirectory(self.database_path));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        Ok(self)
    }
}

/// Returns the platform-specific config directory for stopwatch.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stopwatch"))
}

/// Returns the platform-specific data directory for stopwatch.
///
/// On Linux: `~/.local/share/stopwatch`
fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("stopwatch"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_file(contents: &str) -> Result<Config, ConfigError> {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("custom.toml");
        std::fs::write(&config_path, contents).unwrap();
        Config::load_from(Some(&config_path))
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(data_dir.file_name().unwrap(), "stopwatch");
        assert_eq!(config.database_path, data_dir.join("data.dat"));
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_config_file_overrides_default() {
        let config = load_file("database_path = \"/tmp/custom.dat\"\nhistory_limit = 3\n").unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/custom.dat"));
        assert_eq!(config.history_limit, 3);
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let config = load_file("database_path = \"~/timesheets/sw.dat\"\n").unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(config.database_path, home.join("timesheets/sw.dat"));
    }

    #[test]
    fn test_empty_database_path_is_rejected() {
        let err = load_file("database_path = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDatabasePath));
    }

    #[test]
    fn test_directory_database_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&format!("database_path = {:?}\n", dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::DatabasePathIsDirectory(_)));
    }

    #[test]
    fn test_zero_history_limit_is_rejected() {
        let err = load_file("history_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyHistory));
    }
}
