//! Runtime configuration.
//!
//! Values come from `COUNCIL_*` environment variables; front-ends may
//! override individual fields afterwards.

use crate::logging::{LogLevel, LoggingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "COUNCIL_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "COUNCIL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "COUNCIL_LOG_DIR";

/// Core settings shared by every front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file. `None` means unset; front-ends that open storage
    /// reject it (the CLI exits with a usage error).
    pub db_path: Option<PathBuf>,
    /// Level name; `None` picks the build default.
    pub log_level: Option<String>,
    /// Absolute log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            db_path: non_blank(ENV_DB_PATH).map(PathBuf::from),
            log_level: non_blank(ENV_LOG_LEVEL),
            log_dir: non_blank(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    /// Effective log level.
    pub fn log_level(&self) -> Result<LogLevel, LoggingError> {
        match self.log_level.as_deref() {
            Some(value) => LogLevel::parse(value),
            None => Ok(LogLevel::build_default()),
        }
    }
}
