//! CLI error type and exit codes.
//!
//! Exit codes:
//! - 0: success
//! - 1: storage or setup failure
//! - 2: operation rejected (validation, invariant, limit, not found)
//! - 3: database busy; safe to retry

use council_core::{CoreError, DbError, LoggingError, RepoError};
use std::fmt::{Display, Formatter};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Core(CoreError),
    Open(DbError),
    Logging(LoggingError),
    /// Member/department/group reference that resolved to nothing.
    UnknownReference { kind: &'static str, value: String },
    Output(serde_json::Error),
    /// Neither `--db` nor `COUNCIL_DB_PATH` was given.
    MissingDatabasePath,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(err) if err.is_retryable() => 3,
            Self::Core(err) if err.is_rejection() => 2,
            Self::UnknownReference { .. } => 2,
            _ => 1,
        }
    }

    pub fn print(&self) {
        match self {
            Self::Core(err) => eprintln!("error[{}]: {err}", err.code()),
            other => eprintln!("error: {other}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::Open(err) => write!(f, "cannot open database: {err}"),
            Self::Logging(err) => write!(f, "cannot start logging: {err}"),
            Self::UnknownReference { kind, value } => write!(f, "unknown {kind} `{value}`"),
            Self::Output(err) => write!(f, "cannot encode output: {err}"),
            Self::MissingDatabasePath => {
                write!(f, "no database given; pass --db or set COUNCIL_DB_PATH")
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<CoreError> for CliError {
    fn from(value: CoreError) -> Self {
        Self::Core(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Core(CoreError::from(value))
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Open(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}
