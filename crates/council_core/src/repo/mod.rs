//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Run every check-then-write sequence inside one `BEGIN IMMEDIATE`
//!   transaction so concurrent writers cannot interleave.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, invariant
//!   violations) in addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::hierarchy::InvariantViolation;
use crate::model::member::{DepartmentId, GroupId, MemberId, Role};
use crate::model::score::ScoreId;
use crate::model::validation::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod directory_repo;
pub mod group_repo;
pub mod leaderboard_repo;
pub mod role_repo;
pub mod score_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity referenced by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Member(MemberId),
    Department(DepartmentId),
    Group(GroupId),
    Score(ScoreId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member(id) => write!(f, "member {id}"),
            Self::Department(id) => write!(f, "department {id}"),
            Self::Group(id) => write!(f, "group {id}"),
            Self::Score(id) => write!(f, "score {id}"),
        }
    }
}

/// Repository error for persistence and transactional checks.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(EntityRef),
    /// Hierarchy check failed inside the write transaction.
    Invariant(InvariantViolation),
    /// Self-service group change already used.
    GroupChangeLimitExceeded {
        member_id: MemberId,
        change_count: u32,
    },
    /// Input rejected by a storage-level uniqueness rule.
    Validation(ValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Invariant(violation) => write!(f, "{violation}"),
            Self::GroupChangeLimitExceeded {
                member_id,
                change_count,
            } => write!(
                f,
                "member {member_id} already changed group {change_count} time(s)"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Invariant(violation) => Some(violation),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<InvariantViolation> for RepoError {
    fn from(value: InvariantViolation) -> Self {
        Self::Invariant(value)
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_role(value: &str, column: &'static str) -> RepoResult<Role> {
    Role::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid role `{value}` in {column}")))
}

pub(crate) fn optional_uuid_text(value: Option<Uuid>) -> Option<String> {
    value.map(|id| id.to_string())
}

/// Verifies the connection went through `open_db*` before a repository uses it.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

/// Loads a member's existence flag inside the caller's transaction.
pub(crate) fn member_exists(conn: &Connection, member_id: MemberId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM members WHERE member_uuid = ?1);",
        [member_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn department_exists(conn: &Connection, department_id: DepartmentId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM departments WHERE department_uuid = ?1);",
        [department_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn group_exists(conn: &Connection, group_id: GroupId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM member_groups WHERE group_uuid = ?1);",
        [group_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
