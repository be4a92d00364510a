//! Configuration management for maintrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "maintrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "maintrack.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MAINTRACK_`, with `__`
///    separating the section from the key, e.g.
///    `MAINTRACK_STORAGE__DATABASE_PATH`)
/// 2. TOML config file at `~/.config/maintrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Access gate configuration.
    pub access: AccessConfig,
    /// CSV import configuration.
    pub import: ImportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/maintrack/maintrack.db`
    pub database_path: Option<PathBuf>,
}

/// Access-gate configuration: which role and permission names guard
/// the gated actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Roles whose members may create and edit assets, problem types
    /// and reports, and run imports.
    pub reporter_roles: Vec<String>,
    /// Permissions that grant read access to report listings and
    /// exports without reporter membership.
    pub view_permissions: Vec<String>,
}

/// CSV import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// `chrono` format string for the entry-date column.
    pub date_format: String,
    /// When true, a malformed entry date fails the row instead of
    /// falling back to today's date with a warning.
    pub strict_dates: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            reporter_roles: vec!["MDI Team".to_string()],
            view_permissions: vec!["report.view_report".to_string()],
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            date_format: "%m/%d/%Y".to_string(),
            strict_dates: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `MAINTRACK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("MAINTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.access.reporter_roles.is_empty() {
            return Err(Error::ConfigValidation {
                message: "access.reporter_roles must name at least one role".to_string(),
            });
        }

        if self.import.date_format.is_empty() {
            return Err(Error::ConfigValidation {
                message: "import.date_format must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.access.reporter_roles, vec!["MDI Team"]);
        assert_eq!(config.access.view_permissions, vec!["report.view_report"]);
        assert_eq!(config.import.date_format, "%m/%d/%Y");
        assert!(!config.import.strict_dates);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_reporter_roles() {
        let mut config = Config::default();
        config.access.reporter_roles.clear();

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("reporter_roles"));
    }

    #[test]
    fn test_validate_empty_date_format() {
        let mut config = Config::default();
        config.import.date_format.clear();

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("date_format"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("maintrack.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("maintrack"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("maintrack"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults).
        // Jailed so a concurrent test's MAINTRACK_ variables can't leak in.
        figment::Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .expect("defaults should load");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_database_path() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MAINTRACK_STORAGE__DATABASE_PATH", "/custom/env.db");
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .expect("config should load");
            assert_eq!(
                config.storage.database_path,
                Some(PathBuf::from("/custom/env.db"))
            );
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_underscored_field() {
        // The double-underscore separator keeps snake_case keys intact.
        figment::Jail::expect_with(|jail| {
            jail.set_env("MAINTRACK_IMPORT__DATE_FORMAT", "%Y-%m-%d");
            jail.set_env("MAINTRACK_IMPORT__STRICT_DATES", "true");
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .expect("config should load");
            assert_eq!(config.import.date_format, "%Y-%m-%d");
            assert!(config.import.strict_dates);
            Ok(())
        });
    }

    #[test]
    fn test_access_config_serialize() {
        let access = AccessConfig::default();
        let json = serde_json::to_string(&access).unwrap();
        assert!(json.contains("reporter_roles"));
        assert!(json.contains("MDI Team"));
    }

    #[test]
    fn test_import_config_deserialize() {
        let json = r#"{"date_format": "%Y-%m-%d", "strict_dates": true}"#;
        let import: ImportConfig = serde_json::from_str(json).unwrap();
        assert_eq!(import.date_format, "%Y-%m-%d");
        assert!(import.strict_dates);
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }
}
