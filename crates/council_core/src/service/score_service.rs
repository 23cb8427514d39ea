//! Score ledger service.
//!
//! # Responsibility
//! - Validate score mutations and delegate them to the ledger repository.
//! - Provide per-member and per-department score listings.
//!
//! # Invariants
//! - The ledger trusts the actor/department pairing it is given; permission
//!   checks belong to the caller.
//! - Score mutations share no locks with role management.

use crate::error::CoreResult;
use crate::model::member::{DepartmentId, MemberId};
use crate::model::score::{NewScore, ScoreEntry, ScoreId, ScorePatch};
use crate::model::validation::{
    ensure_id, ensure_score_value, normalize_limit, normalize_reason, ValidationError,
};
use crate::repo::score_repo::{ScoreListQuery, ScoreRepository};
use crate::service::log_outcome;
use std::time::Instant;

/// Default page size for score listings.
pub const SCORES_DEFAULT_LIMIT: u32 = 50;
/// Upper bound for score listing page size.
pub const SCORES_LIMIT_MAX: u32 = 200;

/// Score ledger facade.
pub struct ScoreService<R: ScoreRepository> {
    repo: R,
}

impl<R: ScoreRepository> ScoreService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records a new score. Negative values are penalties; magnitudes above
    /// `SCORE_ABS_MAX` are rejected.
    pub fn create_score(&self, score: &NewScore) -> CoreResult<ScoreEntry> {
        let started_at = Instant::now();
        let result = self.create_score_inner(score);
        log_outcome(
            "score_create",
            "score",
            &format!(
                "member_id={} department_id={} actor_id={}",
                score.member_id, score.department_id, score.actor_id
            ),
            started_at,
            &result,
        );
        result
    }

    fn create_score_inner(&self, score: &NewScore) -> CoreResult<ScoreEntry> {
        let normalized = NewScore {
            member_id: ensure_id(score.member_id, "member_id")?,
            department_id: ensure_id(score.department_id, "department_id")?,
            value: ensure_score_value(score.value)?,
            actor_id: ensure_id(score.actor_id, "actor_id")?,
            reason: normalize_reason(score.reason.as_deref())?,
        };
        Ok(self.repo.create_score(&normalized)?)
    }

    /// Changes value and/or reason of an existing score.
    pub fn update_score(&self, id: ScoreId, patch: &ScorePatch) -> CoreResult<ScoreEntry> {
        let started_at = Instant::now();
        let result = self.update_score_inner(id, patch);
        log_outcome(
            "score_update",
            "score",
            &format!("score_id={id}"),
            started_at,
            &result,
        );
        result
    }

    fn update_score_inner(&self, id: ScoreId, patch: &ScorePatch) -> CoreResult<ScoreEntry> {
        let id = ensure_id(id, "score_id")?;
        let normalized = ScorePatch {
            value: patch.value.map(ensure_score_value).transpose()?,
            reason: normalize_reason(patch.reason.as_deref())?,
        };
        if normalized.is_empty() {
            return Err(ValidationError::EmptyScoreUpdate.into());
        }
        Ok(self.repo.update_score(id, &normalized)?)
    }

    /// Deletes one score entry.
    pub fn delete_score(&self, id: ScoreId) -> CoreResult<()> {
        let started_at = Instant::now();
        let result = self.delete_score_inner(id);
        log_outcome(
            "score_delete",
            "score",
            &format!("score_id={id}"),
            started_at,
            &result,
        );
        result
    }

    fn delete_score_inner(&self, id: ScoreId) -> CoreResult<()> {
        let id = ensure_id(id, "score_id")?;
        Ok(self.repo.delete_score(id)?)
    }

    pub fn get_score(&self, id: ScoreId) -> CoreResult<Option<ScoreEntry>> {
        let id = ensure_id(id, "score_id")?;
        Ok(self.repo.get_score(id)?)
    }

    /// Lists one member's scores newest first.
    pub fn list_member_scores(
        &self,
        member_id: MemberId,
        limit: Option<u32>,
    ) -> CoreResult<Vec<ScoreEntry>> {
        let query = ScoreListQuery {
            member_id: Some(ensure_id(member_id, "member_id")?),
            department_id: None,
            limit: Some(normalize_limit(limit, SCORES_DEFAULT_LIMIT, SCORES_LIMIT_MAX)),
        };
        Ok(self.repo.list_scores(&query)?)
    }

    /// Lists one department's scores newest first.
    pub fn list_department_scores(
        &self,
        department_id: DepartmentId,
        limit: Option<u32>,
    ) -> CoreResult<Vec<ScoreEntry>> {
        let query = ScoreListQuery {
            member_id: None,
            department_id: Some(ensure_id(department_id, "department_id")?),
            limit: Some(normalize_limit(limit, SCORES_DEFAULT_LIMIT, SCORES_LIMIT_MAX)),
        };
        Ok(self.repo.list_scores(&query)?)
    }
}
