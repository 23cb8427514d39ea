//! Role assignment service.
//!
//! # Responsibility
//! - Validate role requests and hand them to the transactional repository.
//! - Expose role history reads.
//!
//! # Invariants
//! - Exactly one audit entry per successful `assign_role`; zero on failure.
//! - `remove_role` on a plain member without department writes nothing.
//! - The actor id is recorded as given; authorization happens upstream.

use crate::error::CoreResult;
use crate::model::audit::{RoleChangeLogEntry, RoleHistoryQuery};
use crate::model::hierarchy::RoleProposal;
use crate::model::member::{DepartmentId, MemberId, Role};
use crate::model::validation::{ensure_id, normalize_limit, normalize_reason};
use crate::repo::role_repo::{RoleChange, RoleChangeOutcome, RoleRepository};
use crate::service::log_outcome;
use std::time::Instant;

/// Default page size for role history.
pub const HISTORY_DEFAULT_LIMIT: u32 = 50;
/// Upper bound for role history page size.
pub const HISTORY_LIMIT_MAX: u32 = 200;

/// Request to change one member's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleRequest {
    pub subject_id: MemberId,
    pub new_role: Role,
    /// Required for `Role::DepartmentHead`; stored as given for other roles.
    pub department_id: Option<DepartmentId>,
    pub actor_id: MemberId,
    pub reason: Option<String>,
}

/// Role management facade.
pub struct RoleService<R: RoleRepository> {
    repo: R,
}

impl<R: RoleRepository> RoleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Assigns a role after checking hierarchy invariants on a consistent
    /// snapshot.
    ///
    /// # Errors
    /// - `Validation` for nil ids or an oversized reason.
    /// - `NotFound` when the subject or department does not exist.
    /// - `InvariantViolation` when a hierarchy rule rejects the change.
    pub fn assign_role(&self, request: &AssignRoleRequest) -> CoreResult<RoleChangeLogEntry> {
        let started_at = Instant::now();
        let result = self.assign_role_inner(request);
        log_outcome(
            "role_assign",
            "role",
            &format!(
                "subject_id={} actor_id={} new_role={}",
                request.subject_id, request.actor_id, request.new_role
            ),
            started_at,
            &result,
        );
        result
    }

    fn assign_role_inner(&self, request: &AssignRoleRequest) -> CoreResult<RoleChangeLogEntry> {
        let subject_id = ensure_id(request.subject_id, "subject_id")?;
        let actor_id = ensure_id(request.actor_id, "actor_id")?;
        let department_id = request
            .department_id
            .map(|id| ensure_id(id, "department_id"))
            .transpose()?;
        let reason = normalize_reason(request.reason.as_deref())?;

        let change = RoleChange {
            proposal: RoleProposal {
                subject_id,
                new_role: request.new_role,
                department_id,
            },
            actor_id,
            reason,
        };
        Ok(self.repo.assign_role(&change)?)
    }

    /// Demotes the subject to plain member and clears its department.
    ///
    /// Returns `RoleChangeOutcome::Unchanged` without logging when there is
    /// nothing to demote.
    pub fn remove_role(
        &self,
        subject_id: MemberId,
        actor_id: MemberId,
        reason: Option<&str>,
    ) -> CoreResult<RoleChangeOutcome> {
        let started_at = Instant::now();
        let result = self.remove_role_inner(subject_id, actor_id, reason);
        let changed = matches!(result, Ok(RoleChangeOutcome::Changed(_)));
        log_outcome(
            "role_remove",
            "role",
            &format!("subject_id={subject_id} actor_id={actor_id} changed={changed}"),
            started_at,
            &result,
        );
        result
    }

    fn remove_role_inner(
        &self,
        subject_id: MemberId,
        actor_id: MemberId,
        reason: Option<&str>,
    ) -> CoreResult<RoleChangeOutcome> {
        let subject_id = ensure_id(subject_id, "subject_id")?;
        let actor_id = ensure_id(actor_id, "actor_id")?;
        let reason = normalize_reason(reason)?;
        Ok(self.repo.remove_role(subject_id, actor_id, reason)?)
    }

    /// Lists role changes newest first, optionally for one member.
    pub fn role_history(
        &self,
        member_id: Option<MemberId>,
        limit: Option<u32>,
    ) -> CoreResult<Vec<RoleChangeLogEntry>> {
        let member_id = member_id
            .map(|id| ensure_id(id, "member_id"))
            .transpose()?;
        let query = RoleHistoryQuery {
            member_id,
            limit: Some(normalize_limit(
                limit,
                HISTORY_DEFAULT_LIMIT,
                HISTORY_LIMIT_MAX,
            )),
        };
        Ok(self.repo.list_role_history(&query)?)
    }
}
