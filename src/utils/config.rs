use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::query::SqlDialect;
use crate::db::ConnectionInfo;
use crate::error::{Result, ScriptError};

/// Environment variable holding the database password. The password is
/// never written to the config file.
pub const PASSWORD_ENV: &str = "SQLPLUS_SCRIPT_PASSWORD";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub connection: ConnectionInfo,
    pub dialect: SqlDialect,
    /// Commit after every statement instead of once at the end of a script.
    pub auto_commit: bool,
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            connection: ConnectionInfo::default(),
            dialect: SqlDialect::default(),
            auto_commit: false,
            log_filter: "info".to_string(),
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("sqlplus_script");
            path.push("config.json");
            path
        })
    }

    /// Reads the config file, falling back to defaults when there is none.
    /// The password is always taken from the environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path().filter(|path| path.exists()) {
            Some(path) => Self::load_from(&path)?,
            None => Self::new(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| ScriptError::Config(format!("{}: {}", path.display(), err)))?;
        serde_json::from_str(&content)
            .map_err(|err| ScriptError::Config(format!("{}: {}", path.display(), err)))
    }

    /// Defaults plus the environment, for when the config file is unusable.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_env();
        config
    }

    /// Fills the password from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(password) = env::var(PASSWORD_ENV) {
            self.connection.password = password;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
