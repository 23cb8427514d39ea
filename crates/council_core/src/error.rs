//! Public error type returned by every core operation.
//!
//! # Invariants
//! - Every failure is a typed, recoverable value; core never panics on input.
//! - Only `StorageUnavailable` is retryable. Core itself never retries, so a
//!   retried write can never duplicate an audit entry behind the caller's back.

use crate::model::hierarchy::InvariantViolation;
use crate::model::member::MemberId;
use crate::model::validation::ValidationError;
use crate::repo::{EntityRef, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Error kinds surfaced to callers of the integrity engine.
#[derive(Debug)]
pub enum CoreError {
    /// Referenced member, department, group or score does not exist.
    NotFound(EntityRef),
    /// Proposed role assignment breaks a hierarchy rule.
    InvariantViolation(InvariantViolation),
    /// Member already used their self-service group change.
    GroupChangeLimitExceeded {
        member_id: MemberId,
        change_count: u32,
    },
    /// Malformed input.
    Validation(ValidationError),
    /// Storage is busy or locked; safe to retry the whole call.
    StorageUnavailable(RepoError),
    /// Non-transient storage failure.
    Storage(RepoError),
}

impl CoreError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvariantViolation(violation) => violation.code(),
            Self::GroupChangeLimitExceeded { .. } => "group_change_limit_exceeded",
            Self::Validation(_) => "validation_error",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Returns whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Returns whether the request was refused by a business rule, as opposed
    /// to failing in storage.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::StorageUnavailable(_) | Self::Storage(_))
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::InvariantViolation(violation) => write!(f, "invariant violation: {violation}"),
            Self::GroupChangeLimitExceeded {
                member_id,
                change_count,
            } => write!(
                f,
                "member {member_id} already used {change_count} group change(s)"
            ),
            Self::Validation(err) => write!(f, "validation error: {err}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvariantViolation(violation) => Some(violation),
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) | Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::GroupChangeLimitExceeded { .. } => None,
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        if matches!(&value, RepoError::Db(err) if err.is_transient()) {
            return Self::StorageUnavailable(value);
        }
        match value {
            RepoError::NotFound(entity) => Self::NotFound(entity),
            RepoError::Invariant(violation) => Self::InvariantViolation(violation),
            RepoError::GroupChangeLimitExceeded {
                member_id,
                change_count,
            } => Self::GroupChangeLimitExceeded {
                member_id,
                change_count,
            },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::db::DbError;
    use crate::model::hierarchy::InvariantViolation;
    use crate::repo::{EntityRef, RepoError};
    use rusqlite::ffi;
    use uuid::Uuid;

    fn sqlite_failure(code: i32) -> RepoError {
        RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(code),
            None,
        )))
    }

    #[test]
    fn busy_database_maps_to_retryable_error() {
        let err = CoreError::from(sqlite_failure(ffi::SQLITE_BUSY));
        assert!(matches!(err, CoreError::StorageUnavailable(_)));
        assert!(err.is_retryable());
        assert!(!err.is_rejection());
    }

    #[test]
    fn other_storage_failures_are_not_retryable() {
        let err = CoreError::from(sqlite_failure(ffi::SQLITE_CORRUPT));
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn semantic_repo_errors_keep_their_kind() {
        let id = Uuid::new_v4();
        assert!(matches!(
            CoreError::from(RepoError::NotFound(EntityRef::Member(id))),
            CoreError::NotFound(EntityRef::Member(found)) if found == id
        ));
        let err = CoreError::from(RepoError::Invariant(InvariantViolation::ProtectedRole));
        assert_eq!(err.code(), "protected_role");
        assert!(err.is_rejection());
    }
}
