//! Process settings.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Environment variables: `ORGTREE_*` prefix
//! 3. Explicit overrides from the caller (CLI flags)

use crate::logging::default_log_level;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "orgtree.sqlite3";
const ENV_PREFIX: &str = "ORGTREE";

/// Runtime settings for opening the store and starting logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl Settings {
    /// Loads defaults overlaid with `ORGTREE_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("db_path", defaults.db_path.to_string_lossy().to_string())?
            .set_default("log_level", defaults.log_level)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Applies caller-provided overrides on top of loaded settings.
    pub fn with_overrides(
        mut self,
        db_path: Option<PathBuf>,
        log_level: Option<String>,
        log_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        if let Some(log_level) = log_level {
            self.log_level = log_level;
        }
        if log_dir.is_some() {
            self.log_dir = log_dir;
        }
        self
    }
}
