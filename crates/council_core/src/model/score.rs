//! Score ledger entries.
//!
//! Scores are signed integers; negative values are penalties.

use crate::model::member::{DepartmentId, MemberId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable score entry identifier.
pub type ScoreId = Uuid;

/// One score record attributed to a member and a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: ScoreId,
    pub member_id: MemberId,
    pub department_id: DepartmentId,
    pub value: i64,
    pub reason: Option<String>,
    pub actor_id: MemberId,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

/// Input for a new score entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub member_id: MemberId,
    pub department_id: DepartmentId,
    pub value: i64,
    pub actor_id: MemberId,
    pub reason: Option<String>,
}

/// Partial update of an existing score entry. `None` keeps the stored field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScorePatch {
    pub value: Option<i64>,
    pub reason: Option<String>,
}

impl ScorePatch {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.reason.is_none()
    }
}
