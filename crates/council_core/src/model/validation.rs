//! Input validation shared by every mutating operation.
//!
//! # Invariants
//! - Validation runs before any storage access, so rejected input never
//!   opens a transaction.
//! - Normalizers return the canonical value that gets persisted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]{2,31}$").expect("valid handle regex"));

/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX_CHARS: usize = 80;
/// Maximum free-text reason length in characters.
pub const REASON_MAX_CHARS: usize = 500;
/// Largest magnitude a single score entry may carry. Keeps every member
/// total, and the ledger total, far inside `i64`.
pub const SCORE_ABS_MAX: i64 = 1_000_000_000;

/// Malformed caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier argument is the nil UUID.
    NilId(&'static str),
    /// Handle does not match `[a-z0-9][a-z0-9._-]{2,31}`.
    InvalidHandle(String),
    /// Handle is already taken by another member.
    DuplicateHandle(String),
    /// Display name is blank after trim.
    BlankDisplayName,
    /// Display name exceeds `DISPLAY_NAME_MAX_CHARS`.
    DisplayNameTooLong,
    /// Reason exceeds `REASON_MAX_CHARS`.
    ReasonTooLong,
    /// Score update carries neither a value nor a reason.
    EmptyScoreUpdate,
    /// Score value magnitude exceeds `SCORE_ABS_MAX`.
    ScoreOutOfRange(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId(field) => write!(f, "`{field}` must not be the nil id"),
            Self::InvalidHandle(value) => write!(f, "invalid handle: `{value}`"),
            Self::DuplicateHandle(value) => write!(f, "handle already taken: `{value}`"),
            Self::BlankDisplayName => write!(f, "display name must not be blank"),
            Self::DisplayNameTooLong => write!(
                f,
                "display name must be at most {DISPLAY_NAME_MAX_CHARS} characters"
            ),
            Self::ReasonTooLong => {
                write!(f, "reason must be at most {REASON_MAX_CHARS} characters")
            }
            Self::EmptyScoreUpdate => write!(f, "score update must change value or reason"),
            Self::ScoreOutOfRange(value) => write!(
                f,
                "score {value} is outside -{SCORE_ABS_MAX}..={SCORE_ABS_MAX}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Rejects the nil UUID for the named argument.
pub fn ensure_id(id: Uuid, field: &'static str) -> Result<Uuid, ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilId(field));
    }
    Ok(id)
}

/// Trims and lowercases a handle, then checks its shape.
pub fn normalize_handle(handle: &str) -> Result<String, ValidationError> {
    let normalized = handle.trim().to_ascii_lowercase();
    if !HANDLE_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidHandle(handle.to_string()));
    }
    Ok(normalized)
}

/// Trims a display name and enforces length bounds.
pub fn normalize_display_name(display_name: &str) -> Result<String, ValidationError> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankDisplayName);
    }
    if trimmed.chars().count() > DISPLAY_NAME_MAX_CHARS {
        return Err(ValidationError::DisplayNameTooLong);
    }
    Ok(trimmed.to_string())
}

/// Trims an optional reason. Blank reasons collapse to `None`.
pub fn normalize_reason(reason: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = reason.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > REASON_MAX_CHARS {
        return Err(ValidationError::ReasonTooLong);
    }
    Ok(Some(trimmed.to_string()))
}

/// Checks a score value against `SCORE_ABS_MAX`.
pub fn ensure_score_value(value: i64) -> Result<i64, ValidationError> {
    if !(-SCORE_ABS_MAX..=SCORE_ABS_MAX).contains(&value) {
        return Err(ValidationError::ScoreOutOfRange(value));
    }
    Ok(value)
}

/// Applies default/max bounds to a caller-provided page size.
///
/// `None` and `Some(0)` map to `default`; larger values clamp to `max`.
pub fn normalize_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    match limit {
        Some(0) | None => default,
        Some(value) if value > max => max,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_lowercased_and_trimmed() {
        assert_eq!(
            normalize_handle("  USC.President_IX ").unwrap(),
            "usc.president_ix"
        );
    }

    #[test]
    fn handle_rejects_bad_shapes() {
        let too_long = "x".repeat(33);
        for bad in ["", "ab", ".leading", "has space", "emoji🙂x", too_long.as_str()] {
            assert!(
                matches!(normalize_handle(bad), Err(ValidationError::InvalidHandle(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn blank_reason_collapses_to_none() {
        assert_eq!(normalize_reason(Some("   ")).unwrap(), None);
        assert_eq!(normalize_reason(None).unwrap(), None);
        assert_eq!(
            normalize_reason(Some(" promoted ")).unwrap().as_deref(),
            Some("promoted")
        );
        let long = "r".repeat(REASON_MAX_CHARS + 1);
        assert_eq!(
            normalize_reason(Some(&long)).unwrap_err(),
            ValidationError::ReasonTooLong
        );
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_limit(None, 50, 200), 50);
        assert_eq!(normalize_limit(Some(0), 50, 200), 50);
        assert_eq!(normalize_limit(Some(7), 50, 200), 7);
        assert_eq!(normalize_limit(Some(9_999), 50, 200), 200);
    }

    #[test]
    fn score_value_is_bounded_both_ways() {
        assert_eq!(ensure_score_value(-SCORE_ABS_MAX), Ok(-SCORE_ABS_MAX));
        assert_eq!(ensure_score_value(SCORE_ABS_MAX), Ok(SCORE_ABS_MAX));
        assert_eq!(
            ensure_score_value(SCORE_ABS_MAX + 1),
            Err(ValidationError::ScoreOutOfRange(SCORE_ABS_MAX + 1))
        );
        assert_eq!(
            ensure_score_value(i64::MIN),
            Err(ValidationError::ScoreOutOfRange(i64::MIN))
        );
    }

    #[test]
    fn nil_id_is_rejected() {
        assert_eq!(
            ensure_id(Uuid::nil(), "subject_id").unwrap_err(),
            ValidationError::NilId("subject_id")
        );
        assert!(ensure_id(Uuid::new_v4(), "subject_id").is_ok());
    }
}
