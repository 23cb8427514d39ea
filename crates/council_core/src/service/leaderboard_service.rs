//! Leaderboard aggregator.
//!
//! Recomputed from the score ledger on every call; no rank is persisted, so
//! the result is always as fresh as the last committed score mutation.

use crate::error::CoreResult;
use crate::model::leaderboard::{rank_tallies, LeaderboardEntry, RankingMode};
use crate::model::member::GroupId;
use crate::model::validation::ensure_id;
use crate::repo::leaderboard_repo::LeaderboardRepository;
use crate::service::log_outcome;
use std::time::Instant;

/// Leaderboard request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaderboardQuery {
    /// Restrict to one group's members; ranks are computed within the group.
    pub group_id: Option<GroupId>,
    /// Truncate after ranking. `None` returns every member.
    pub limit: Option<u32>,
    pub mode: RankingMode,
}

/// Leaderboard facade.
pub struct LeaderboardService<R: LeaderboardRepository> {
    repo: R,
}

impl<R: LeaderboardRepository> LeaderboardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Computes the ranked leaderboard.
    ///
    /// # Errors
    /// - `NotFound` when `group_id` names an unknown group.
    pub fn compute_leaderboard(&self, query: &LeaderboardQuery) -> CoreResult<Vec<LeaderboardEntry>> {
        let started_at = Instant::now();
        let result = self.compute_inner(query);
        let group = query
            .group_id
            .map_or_else(|| "all".to_string(), |id| id.to_string());
        let rows = result.as_ref().map_or(0, Vec::len);
        log_outcome(
            "leaderboard_compute",
            "leaderboard",
            &format!("group_id={group} rows={rows}"),
            started_at,
            &result,
        );
        result
    }

    fn compute_inner(&self, query: &LeaderboardQuery) -> CoreResult<Vec<LeaderboardEntry>> {
        let group_id = query
            .group_id
            .map(|id| ensure_id(id, "group_id"))
            .transpose()?;
        let tallies = self.repo.member_tallies(group_id)?;
        let mut ranked = rank_tallies(tallies, query.mode);
        if let Some(limit) = query.limit {
            ranked.truncate(limit as usize);
        }
        Ok(ranked)
    }
}
