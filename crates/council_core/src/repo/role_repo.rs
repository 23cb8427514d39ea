//! Role assignment persistence and the append-only audit log.
//!
//! # Responsibility
//! - Apply role transitions atomically: snapshot, check, update, log.
//! - Read role history newest first.
//!
//! # Invariants
//! - The hierarchy snapshot is read under the same `BEGIN IMMEDIATE` lock
//!   that writes the change, so two writers can never both pass a check
//!   against stale state.
//! - A committed role change always has exactly one audit row, and a failed
//!   one has none: both writes share one transaction.
//! - `role_change_logs` rows are never updated or deleted (also enforced by
//!   SQL triggers).

use crate::model::audit::{RoleChangeLogEntry, RoleHistoryQuery};
use crate::model::hierarchy::RoleProposal;
use crate::model::member::{DepartmentId, MemberId, Role};
use crate::repo::directory_repo::{load_hierarchy_snapshot, load_member};
use crate::repo::{
    department_exists, ensure_connection_ready, optional_uuid_text, parse_optional_uuid,
    parse_role, parse_uuid, EntityRef, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const LOG_SELECT_SQL: &str = "SELECT
    log_uuid,
    member_uuid,
    old_role,
    new_role,
    old_department_uuid,
    new_department_uuid,
    actor_uuid,
    reason,
    created_at
FROM role_change_logs";

/// Validated role change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub proposal: RoleProposal,
    pub actor_id: MemberId,
    pub reason: Option<String>,
}

/// Result of a demotion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChangeOutcome {
    /// The transition was applied and logged.
    Changed(RoleChangeLogEntry),
    /// Subject already was a plain member without department; nothing written.
    Unchanged,
}

/// Audit row to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewRoleChangeLog {
    pub member_id: MemberId,
    pub old_role: Option<Role>,
    pub new_role: Role,
    pub old_department_id: Option<DepartmentId>,
    pub new_department_id: Option<DepartmentId>,
    pub actor_id: MemberId,
    pub reason: Option<String>,
}

/// Repository interface for role transitions and their history.
pub trait RoleRepository {
    /// Checks and applies one assignment, returning its audit entry.
    fn assign_role(&self, change: &RoleChange) -> RepoResult<RoleChangeLogEntry>;
    /// Demotes the subject to plain member and clears the department.
    fn remove_role(
        &self,
        subject_id: MemberId,
        actor_id: MemberId,
        reason: Option<String>,
    ) -> RepoResult<RoleChangeOutcome>;
    /// Lists history newest first.
    fn list_role_history(&self, query: &RoleHistoryQuery) -> RepoResult<Vec<RoleChangeLogEntry>>;
}

/// SQLite-backed role repository.
pub struct SqliteRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["members", "role_change_logs"])?;
        Ok(Self { conn })
    }
}

impl RoleRepository for SqliteRoleRepository<'_> {
    fn assign_role(&self, change: &RoleChange) -> RepoResult<RoleChangeLogEntry> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let entry = apply_transition(&tx, change)?;
        tx.commit()?;
        Ok(entry)
    }

    fn remove_role(
        &self,
        subject_id: MemberId,
        actor_id: MemberId,
        reason: Option<String>,
    ) -> RepoResult<RoleChangeOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let subject = load_member(&tx, subject_id)?
            .ok_or(RepoError::NotFound(EntityRef::Member(subject_id)))?;
        if subject.role == Role::Member && subject.department_id.is_none() {
            return Ok(RoleChangeOutcome::Unchanged);
        }

        let change = RoleChange {
            proposal: RoleProposal {
                subject_id,
                new_role: Role::Member,
                department_id: None,
            },
            actor_id,
            reason,
        };
        let entry = apply_transition(&tx, &change)?;
        tx.commit()?;
        Ok(RoleChangeOutcome::Changed(entry))
    }

    fn list_role_history(&self, query: &RoleHistoryQuery) -> RepoResult<Vec<RoleChangeLogEntry>> {
        let mut sql = format!("{LOG_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(member_id) = query.member_id {
            sql.push_str(" AND member_uuid = ?");
            bind_values.push(Value::Text(member_id.to_string()));
        }
        sql.push_str(" ORDER BY seq DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_log_row(row)?);
        }
        Ok(entries)
    }
}

/// Runs check, update and audit insert on an open write transaction.
fn apply_transition(conn: &Connection, change: &RoleChange) -> RepoResult<RoleChangeLogEntry> {
    let proposal = &change.proposal;
    let subject = load_member(conn, proposal.subject_id)?
        .ok_or(RepoError::NotFound(EntityRef::Member(proposal.subject_id)))?;
    if let Some(department_id) = proposal.department_id {
        if !department_exists(conn, department_id)? {
            return Err(RepoError::NotFound(EntityRef::Department(department_id)));
        }
    }

    load_hierarchy_snapshot(conn)?.check(proposal)?;

    conn.execute(
        "UPDATE members
         SET role = ?2,
             department_uuid = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE member_uuid = ?1;",
        params![
            proposal.subject_id.to_string(),
            proposal.new_role.as_str(),
            optional_uuid_text(proposal.department_id),
        ],
    )?;

    insert_role_change_log(
        conn,
        &NewRoleChangeLog {
            member_id: proposal.subject_id,
            old_role: Some(subject.role),
            new_role: proposal.new_role,
            old_department_id: subject.department_id,
            new_department_id: proposal.department_id,
            actor_id: change.actor_id,
            reason: change.reason.clone(),
        },
    )
}

/// Appends one audit row and reads it back.
pub(crate) fn insert_role_change_log(
    conn: &Connection,
    entry: &NewRoleChangeLog,
) -> RepoResult<RoleChangeLogEntry> {
    let log_id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO role_change_logs (
            log_uuid,
            member_uuid,
            old_role,
            new_role,
            old_department_uuid,
            new_department_uuid,
            actor_uuid,
            reason
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            log_id.to_string(),
            entry.member_id.to_string(),
            entry.old_role.map(Role::as_str),
            entry.new_role.as_str(),
            optional_uuid_text(entry.old_department_id),
            optional_uuid_text(entry.new_department_id),
            entry.actor_id.to_string(),
            entry.reason.as_deref(),
        ],
    )?;

    let mut stmt = conn.prepare(&format!("{LOG_SELECT_SQL} WHERE log_uuid = ?1;"))?;
    let mut rows = stmt.query([log_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_log_row(row);
    }
    Err(RepoError::InvalidData(format!(
        "role change log {log_id} missing after insert"
    )))
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<RoleChangeLogEntry> {
    let log_uuid: String = row.get("log_uuid")?;
    let member_uuid: String = row.get("member_uuid")?;
    let actor_uuid: String = row.get("actor_uuid")?;
    let new_role: String = row.get("new_role")?;
    let old_role = row
        .get::<_, Option<String>>("old_role")?
        .map(|value| parse_role(&value, "role_change_logs.old_role"))
        .transpose()?;

    Ok(RoleChangeLogEntry {
        id: parse_uuid(&log_uuid, "role_change_logs.log_uuid")?,
        member_id: parse_uuid(&member_uuid, "role_change_logs.member_uuid")?,
        old_role,
        new_role: parse_role(&new_role, "role_change_logs.new_role")?,
        old_department_id: parse_optional_uuid(
            row.get("old_department_uuid")?,
            "role_change_logs.old_department_uuid",
        )?,
        new_department_id: parse_optional_uuid(
            row.get("new_department_uuid")?,
            "role_change_logs.new_department_uuid",
        )?,
        actor_id: parse_uuid(&actor_uuid, "role_change_logs.actor_uuid")?,
        reason: row.get("reason")?,
        created_at: row.get("created_at")?,
    })
}
