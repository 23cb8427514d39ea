//! Score ledger persistence.
//!
//! # Invariants
//! - Every score references an existing member and department.
//! - Listings are newest first (`seq DESC`).
//! - Update and delete of a missing score return `NotFound`.

use crate::model::member::{DepartmentId, MemberId};
use crate::model::score::{NewScore, ScoreEntry, ScoreId, ScorePatch};
use crate::repo::{
    department_exists, ensure_connection_ready, member_exists, parse_uuid, EntityRef, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const SCORE_SELECT_SQL: &str = "SELECT
    score_uuid,
    member_uuid,
    department_uuid,
    score,
    reason,
    actor_uuid,
    created_at,
    updated_at
FROM scores";

/// Filter for score listings.
#[derive(Debug, Clone, Default)]
pub struct ScoreListQuery {
    pub member_id: Option<MemberId>,
    pub department_id: Option<DepartmentId>,
    pub limit: Option<u32>,
}

/// Repository interface for the score ledger.
pub trait ScoreRepository {
    fn create_score(&self, score: &NewScore) -> RepoResult<ScoreEntry>;
    fn update_score(&self, id: ScoreId, patch: &ScorePatch) -> RepoResult<ScoreEntry>;
    fn delete_score(&self, id: ScoreId) -> RepoResult<()>;
    fn get_score(&self, id: ScoreId) -> RepoResult<Option<ScoreEntry>>;
    fn list_scores(&self, query: &ScoreListQuery) -> RepoResult<Vec<ScoreEntry>>;
}

/// SQLite-backed score repository.
pub struct SqliteScoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScoreRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["scores", "members", "departments"])?;
        Ok(Self { conn })
    }
}

impl ScoreRepository for SqliteScoreRepository<'_> {
    fn create_score(&self, score: &NewScore) -> RepoResult<ScoreEntry> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !member_exists(&tx, score.member_id)? {
            return Err(RepoError::NotFound(EntityRef::Member(score.member_id)));
        }
        if !department_exists(&tx, score.department_id)? {
            return Err(RepoError::NotFound(EntityRef::Department(
                score.department_id,
            )));
        }

        let score_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO scores (
                score_uuid,
                member_uuid,
                department_uuid,
                score,
                reason,
                actor_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                score_id.to_string(),
                score.member_id.to_string(),
                score.department_id.to_string(),
                score.value,
                score.reason.as_deref(),
                score.actor_id.to_string(),
            ],
        )?;
        let created = load_required_score(&tx, score_id)?;
        tx.commit()?;
        Ok(created)
    }

    fn update_score(&self, id: ScoreId, patch: &ScorePatch) -> RepoResult<ScoreEntry> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE scores
             SET score = COALESCE(?2, score),
                 reason = COALESCE(?3, reason),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE score_uuid = ?1;",
            params![id.to_string(), patch.value, patch.reason.as_deref()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Score(id)));
        }
        let updated = load_required_score(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_score(&self, id: ScoreId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM scores WHERE score_uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Score(id)));
        }
        Ok(())
    }

    fn get_score(&self, id: ScoreId) -> RepoResult<Option<ScoreEntry>> {
        load_score(self.conn, id)
    }

    fn list_scores(&self, query: &ScoreListQuery) -> RepoResult<Vec<ScoreEntry>> {
        let mut sql = format!("{SCORE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(member_id) = query.member_id {
            sql.push_str(" AND member_uuid = ?");
            bind_values.push(Value::Text(member_id.to_string()));
        }
        if let Some(department_id) = query.department_id {
            sql.push_str(" AND department_uuid = ?");
            bind_values.push(Value::Text(department_id.to_string()));
        }
        sql.push_str(" ORDER BY seq DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut scores = Vec::new();
        while let Some(row) = rows.next()? {
            scores.push(parse_score_row(row)?);
        }
        Ok(scores)
    }
}

fn load_score(conn: &Connection, id: ScoreId) -> RepoResult<Option<ScoreEntry>> {
    let mut stmt = conn.prepare(&format!("{SCORE_SELECT_SQL} WHERE score_uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_score_row(row)?));
    }
    Ok(None)
}

fn load_required_score(conn: &Connection, id: ScoreId) -> RepoResult<ScoreEntry> {
    load_score(conn, id)?.ok_or(RepoError::NotFound(EntityRef::Score(id)))
}

fn parse_score_row(row: &Row<'_>) -> RepoResult<ScoreEntry> {
    let score_uuid: String = row.get("score_uuid")?;
    let member_uuid: String = row.get("member_uuid")?;
    let department_uuid: String = row.get("department_uuid")?;
    let actor_uuid: String = row.get("actor_uuid")?;

    Ok(ScoreEntry {
        id: parse_uuid(&score_uuid, "scores.score_uuid")?,
        member_id: parse_uuid(&member_uuid, "scores.member_uuid")?,
        department_id: parse_uuid(&department_uuid, "scores.department_uuid")?,
        value: row.get("score")?,
        reason: row.get("reason")?,
        actor_id: parse_uuid(&actor_uuid, "scores.actor_uuid")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
