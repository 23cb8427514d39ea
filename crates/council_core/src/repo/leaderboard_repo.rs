//! Leaderboard aggregation reads.
//!
//! # Invariants
//! - Totals are summed in one statement, so every tally reflects the same
//!   committed state.
//! - Members without scores appear with total `0` and `score_count` `0`.

use crate::model::leaderboard::MemberTally;
use crate::model::member::GroupId;
use crate::repo::{
    ensure_connection_ready, group_exists, parse_optional_uuid, parse_uuid, EntityRef, RepoError,
    RepoResult,
};
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for leaderboard input.
pub trait LeaderboardRepository {
    /// Sums scores per member, optionally limited to one group's members.
    fn member_tallies(&self, group_id: Option<GroupId>) -> RepoResult<Vec<MemberTally>>;
}

/// SQLite-backed leaderboard repository.
pub struct SqliteLeaderboardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeaderboardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["members", "member_groups", "scores"])?;
        Ok(Self { conn })
    }
}

impl LeaderboardRepository for SqliteLeaderboardRepository<'_> {
    fn member_tallies(&self, group_id: Option<GroupId>) -> RepoResult<Vec<MemberTally>> {
        // Deferred: a read transaction that pins one snapshot for both queries.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        if let Some(group_id) = group_id {
            if !group_exists(&tx, group_id)? {
                return Err(RepoError::NotFound(EntityRef::Group(group_id)));
            }
        }

        let mut tallies = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT
                    m.member_uuid AS member_uuid,
                    m.handle AS handle,
                    m.display_name AS display_name,
                    m.group_uuid AS group_uuid,
                    g.name AS group_name,
                    m.seq AS seq,
                    COALESCE(SUM(s.score), 0) AS total_score,
                    COUNT(s.score_uuid) AS score_count
                 FROM members m
                 LEFT JOIN member_groups g ON g.group_uuid = m.group_uuid
                 LEFT JOIN scores s ON s.member_uuid = m.member_uuid
                 WHERE (?1 IS NULL OR m.group_uuid = ?1)
                 GROUP BY m.seq
                 ORDER BY m.seq ASC;",
            )?;
            let mut rows = stmt.query([group_id.map(|id| id.to_string())])?;
            while let Some(row) = rows.next()? {
                tallies.push(parse_tally_row(row)?);
            }
        }
        tx.commit()?;
        Ok(tallies)
    }
}

fn parse_tally_row(row: &Row<'_>) -> RepoResult<MemberTally> {
    let member_uuid: String = row.get("member_uuid")?;
    Ok(MemberTally {
        member_id: parse_uuid(&member_uuid, "members.member_uuid")?,
        handle: row.get("handle")?,
        display_name: row.get("display_name")?,
        group_id: parse_optional_uuid(row.get("group_uuid")?, "members.group_uuid")?,
        group_name: row.get("group_name")?,
        created_seq: row.get("seq")?,
        total_score: row.get("total_score")?,
        score_count: row.get("score_count")?,
    })
}
