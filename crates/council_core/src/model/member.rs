//! Member directory model and static reference data.
//!
//! # Responsibility
//! - Define members, their role in the hierarchy, and the department/group
//!   reference rows they point to.
//!
//! # Invariants
//! - `department_id` is always set for `Role::DepartmentHead`.
//! - `group_id` is always set for `Role::GroupLeader`.
//! - `created_seq` is strictly increasing in creation order and is the
//!   tie-break key for leaderboard ordering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable member identifier.
pub type MemberId = Uuid;
/// Stable department identifier.
pub type DepartmentId = Uuid;
/// Stable group identifier.
pub type GroupId = Uuid;

/// Position of a member in the organization hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Single top-level role, created once at bootstrap.
    President,
    /// Head of exactly one department.
    DepartmentHead,
    /// Leader of exactly one group.
    GroupLeader,
    /// Plain member without management scope.
    Member,
}

impl Role {
    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::President => "president",
            Self::DepartmentHead => "department_head",
            Self::GroupLeader => "group_leader",
            Self::Member => "member",
        }
    }

    /// Parses the storage/wire string form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "president" => Some(Self::President),
            "department_head" => Some(Self::DepartmentHead),
            "group_leader" => Some(Self::GroupLeader),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory record for one organization member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Unique login-style handle, lowercase.
    pub handle: String,
    pub display_name: String,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
    pub group_id: Option<GroupId>,
    /// Self-service group changes used so far. Never decremented.
    pub group_change_count: u32,
    /// Creation order key.
    pub created_seq: i64,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

impl Member {
    /// Projects the hierarchy-relevant fields of this member.
    pub fn assignment(&self) -> RoleAssignment {
        RoleAssignment {
            member_id: self.id,
            role: self.role,
            department_id: self.department_id,
            group_id: self.group_id,
        }
    }
}

/// Current role/department/group mapping of one member.
///
/// Derived from `Member`, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub member_id: MemberId,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
    pub group_id: Option<GroupId>,
}

/// Static department reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    /// Unique symbolic name, e.g. `sports_department`.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Static group reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Unique symbolic name, one of `G1`, `G2`, `G3`.
    pub name: String,
    pub display_name: String,
}
