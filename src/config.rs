//! Application settings loaded from a TOML properties file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::runtime::{bus::DEFAULT_MAX_DEPTH, handle::RuntimeConfig};

/// Environment variable naming the properties file.
pub const CONFIG_ENV: &str = "CANTEEN_CONFIG";

/// Failure while loading [`AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`AppConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Account created at startup when no user of that name exists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminBootstrap {
    /// Login name.
    pub name: String,
    /// Clear-text password; hashed before storage.
    pub password: String,
    /// Contact address.
    pub email: String,
}

/// Settings for [`crate::app::App`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; `None` keeps the catalog in memory.
    pub database_path: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Nesting limit for re-entrant bus dispatch.
    pub max_dispatch_depth: usize,
    /// Optional admin account to create at startup.
    pub admin: Option<AdminBootstrap>,
    /// Async runtime queue sizes.
    pub runtime: RuntimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: "info".to_string(),
            max_dispatch_depth: DEFAULT_MAX_DEPTH,
            admin: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses settings from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads the file named by [`CONFIG_ENV`], or defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = AppConfig::from_toml_str("log_level = \"debug\"").unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.database_path, None);
        assert_eq!(cfg.max_dispatch_depth, DEFAULT_MAX_DEPTH);
        assert!(cfg.admin.is_none());
    }

    #[test]
    fn full_file() {
        let raw = r#"
            database_path = "canteen.db"
            max_dispatch_depth = 8

            [admin]
            name = "root"
            password = "secret"
            email = "root@canteen.local"

            [runtime]
            command_queue_bound = 4
        "#;
        let cfg = AppConfig::from_toml_str(raw).unwrap();
        assert_eq!(cfg.database_path, Some(PathBuf::from("canteen.db")));
        assert_eq!(cfg.max_dispatch_depth, 8);
        assert_eq!(cfg.admin.unwrap().name, "root");
        assert_eq!(cfg.runtime.command_queue_bound, 4);
        assert_eq!(cfg.runtime.screen_buffer, RuntimeConfig::default().screen_buffer);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("max_dispatch_depth = \"deep\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
