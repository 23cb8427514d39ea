//! Group membership persistence with the one-change self-service limit.
//!
//! # Invariants
//! - `group_change_count` only ever increases, by exactly one per accepted
//!   self-service change.
//! - Re-selecting the current group is not a change.
//! - The administrative override never touches `group_change_count`.
//! - A group leader cannot be moved into a group that already has a leader.

use crate::model::member::{GroupId, Member, MemberId};
use crate::repo::directory_repo::{load_hierarchy_snapshot, load_member, load_required_member};
use crate::repo::{ensure_connection_ready, group_exists, EntityRef, RepoError, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Self-service changes allowed per member.
pub const GROUP_CHANGE_LIMIT: u32 = 1;

/// Result of a group change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupChangeOutcome {
    /// Group was switched; carries the updated member.
    Changed(Member),
    /// Requested group equals the current group; nothing written.
    Unchanged(Member),
}

impl GroupChangeOutcome {
    pub fn member(&self) -> &Member {
        match self {
            Self::Changed(member) | Self::Unchanged(member) => member,
        }
    }
}

/// Repository interface for group assignment.
pub trait GroupAssignmentRepository {
    /// Member self-service change, limited to `GROUP_CHANGE_LIMIT`.
    fn set_group(&self, subject_id: MemberId, group_id: GroupId)
        -> RepoResult<GroupChangeOutcome>;
    /// Administrative reassignment outside the self-service limit.
    fn override_group(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
    ) -> RepoResult<GroupChangeOutcome>;
}

/// SQLite-backed group assignment repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["members", "member_groups"])?;
        Ok(Self { conn })
    }

    fn move_member(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
        counted: bool,
    ) -> RepoResult<GroupChangeOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let subject = load_member(&tx, subject_id)?
            .ok_or(RepoError::NotFound(EntityRef::Member(subject_id)))?;
        if !group_exists(&tx, group_id)? {
            return Err(RepoError::NotFound(EntityRef::Group(group_id)));
        }
        if subject.group_id == Some(group_id) {
            return Ok(GroupChangeOutcome::Unchanged(subject));
        }
        if counted && subject.group_change_count >= GROUP_CHANGE_LIMIT {
            return Err(RepoError::GroupChangeLimitExceeded {
                member_id: subject_id,
                change_count: subject.group_change_count,
            });
        }

        load_hierarchy_snapshot(&tx)?.check_group_move(subject_id, group_id)?;

        tx.execute(
            "UPDATE members
             SET group_uuid = ?2,
                 group_change_count = group_change_count + ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE member_uuid = ?1;",
            params![
                subject_id.to_string(),
                group_id.to_string(),
                i64::from(counted),
            ],
        )?;
        let updated = load_required_member(&tx, subject_id)?;
        tx.commit()?;
        Ok(GroupChangeOutcome::Changed(updated))
    }
}

impl GroupAssignmentRepository for SqliteGroupRepository<'_> {
    fn set_group(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
    ) -> RepoResult<GroupChangeOutcome> {
        self.move_member(subject_id, group_id, true)
    }

    fn override_group(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
    ) -> RepoResult<GroupChangeOutcome> {
        self.move_member(subject_id, group_id, false)
    }
}
