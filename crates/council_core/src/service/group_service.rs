//! Group assignment guard.
//!
//! # Responsibility
//! - Enforce the single self-service group change per member.
//! - Provide the separately authorized administrative reassignment.
//!
//! # Invariants
//! - `set_group` never raises `group_change_count` above `GROUP_CHANGE_LIMIT`.
//! - Choosing the current group again succeeds and is not counted.

use crate::error::CoreResult;
use crate::model::member::{GroupId, MemberId};
use crate::model::validation::ensure_id;
use crate::repo::group_repo::{GroupAssignmentRepository, GroupChangeOutcome};
use crate::service::log_outcome;
use std::time::Instant;

/// Group assignment facade.
pub struct GroupService<R: GroupAssignmentRepository> {
    repo: R,
}

impl<R: GroupAssignmentRepository> GroupService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Member self-service group selection.
    ///
    /// # Errors
    /// - `GroupChangeLimitExceeded` when the one allowed change is used up.
    /// - `NotFound` for an unknown member or group.
    /// - `InvariantViolation(GroupLeaderConflict)` when a group leader would
    ///   join a group that already has a leader.
    pub fn set_group(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
    ) -> CoreResult<GroupChangeOutcome> {
        let started_at = Instant::now();
        let result = self.move_member(subject_id, group_id, None);
        log_outcome(
            "group_set",
            "group",
            &format!(
                "subject_id={subject_id} group_id={group_id} changed={}",
                is_changed(&result)
            ),
            started_at,
            &result,
        );
        result
    }

    /// Administrative reassignment that bypasses the self-service limit.
    ///
    /// The caller is responsible for having authorized `actor_id` for this.
    pub fn override_group(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
        actor_id: MemberId,
    ) -> CoreResult<GroupChangeOutcome> {
        let started_at = Instant::now();
        let result = self.move_member(subject_id, group_id, Some(actor_id));
        log_outcome(
            "group_override",
            "group",
            &format!(
                "subject_id={subject_id} group_id={group_id} actor_id={actor_id} changed={}",
                is_changed(&result)
            ),
            started_at,
            &result,
        );
        result
    }

    fn move_member(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
        override_actor: Option<MemberId>,
    ) -> CoreResult<GroupChangeOutcome> {
        let subject_id = ensure_id(subject_id, "subject_id")?;
        let group_id = ensure_id(group_id, "group_id")?;
        match override_actor {
            Some(actor_id) => {
                ensure_id(actor_id, "actor_id")?;
                Ok(self.repo.override_group(subject_id, group_id)?)
            }
            None => Ok(self.repo.set_group(subject_id, group_id)?),
        }
    }
}

fn is_changed(result: &CoreResult<GroupChangeOutcome>) -> bool {
    matches!(result, Ok(GroupChangeOutcome::Changed(_)))
}
