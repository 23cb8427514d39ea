//! Role change audit entries.
//!
//! # Invariants
//! - Entries are append-only: never updated, never deleted.
//! - `old_role` is `None` only for the bootstrap entry of the president.

use crate::model::member::{DepartmentId, MemberId, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable audit entry identifier.
pub type RoleChangeLogId = Uuid;

/// One recorded role transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChangeLogEntry {
    pub id: RoleChangeLogId,
    pub member_id: MemberId,
    pub old_role: Option<Role>,
    pub new_role: Role,
    pub old_department_id: Option<DepartmentId>,
    pub new_department_id: Option<DepartmentId>,
    /// Actor as supplied by the caller's authorization context.
    pub actor_id: MemberId,
    pub reason: Option<String>,
    /// Epoch ms.
    pub created_at: i64,
}

/// Filter for role history reads.
#[derive(Debug, Clone, Default)]
pub struct RoleHistoryQuery {
    pub member_id: Option<MemberId>,
    pub limit: Option<u32>,
}
