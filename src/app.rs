use std::fs;
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::db::query::{ScriptOutcome, ScriptResource, SqlScript};
use crate::db::DatabaseConnection;
use crate::error::{Result, ScriptError};
use crate::utils::config::PASSWORD_ENV;
use crate::utils::AppConfig;

pub struct App {
    pub(crate) config: AppConfig,
    /// Why the config file was ignored, reported once logging is up.
    pub(crate) config_error: Option<ScriptError>,
}

impl App {
    pub fn new() -> Self {
        Self::from_loaded(AppConfig::load())
    }

    pub(crate) fn from_loaded(loaded: Result<AppConfig>) -> Self {
        match loaded {
            Ok(config) => Self {
                config,
                config_error: None,
            },
            Err(err) => Self {
                config: AppConfig::from_env(),
                config_error: Some(err),
            },
        }
    }

    /// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.config.log_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();

        if let Some(err) = &self.config_error {
            warn!("Ignoring config file, using defaults: {}", err);
        }
    }

    /// Parses the whole file first, so a script with a broken statement
    /// boundary never touches the database.
    pub fn parse_script(&self, path: &Path) -> Result<SqlScript> {
        let source = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let resource = ScriptResource::new(&name).with_location(&path.display().to_string());

        SqlScript::parse(&source, self.config.dialect, Some(resource))
    }

    pub fn run_script(&self, path: &Path) -> Result<ScriptOutcome> {
        let script = self.parse_script(path)?;
        info!(
            "Parsed {} statements from {}",
            script.len(),
            path.display()
        );

        if self.config.connection.password.is_empty() {
            return Err(ScriptError::Config(format!(
                "no password for {}; set {}",
                self.config.connection.display_string(),
                PASSWORD_ENV
            )));
        }

        let mut conn = DatabaseConnection::connect(self.config.connection.clone())?;
        conn.set_auto_commit(self.config.auto_commit);

        match script.execute(&mut conn) {
            Ok(outcome) => {
                if !self.config.auto_commit {
                    conn.commit()?;
                }
                Ok(outcome)
            }
            Err(err) => {
                if !self.config.auto_commit {
                    if let Err(rollback_err) = conn.rollback() {
                        warn!("Rollback failed: {}", rollback_err);
                    }
                }
                Err(err)
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
