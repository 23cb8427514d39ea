//! Leaderboard ranking.
//!
//! # Responsibility
//! - Turn per-member score totals into a ranked, totally ordered list.
//!
//! # Invariants
//! - Order is `total_score DESC`, then members with score entries before
//!   members without any, then `created_seq ASC`; the input order never
//!   matters, so repeated calls on unchanged data rank identically.
//! - Ranks start at 1.
//! - Sum of `total_score` over the output equals the sum over the input.

use crate::model::member::{GroupId, MemberId};
use serde::{Deserialize, Serialize};

/// How equal totals are ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Ranks are 1..=n in sort order; ties are broken by creation order.
    #[default]
    Sequential,
    /// Equal totals share a rank; the next distinct total takes the next rank.
    Dense,
}

/// Aggregated score total of one member, before ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberTally {
    pub member_id: MemberId,
    pub handle: String,
    pub display_name: String,
    pub group_id: Option<GroupId>,
    pub group_name: Option<String>,
    pub created_seq: i64,
    pub total_score: i64,
    /// Number of ledger entries summed into `total_score`.
    pub score_count: i64,
}

impl MemberTally {
    fn has_scores(&self) -> bool {
        self.score_count > 0
    }
}

/// Ranked leaderboard row. Computed on read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub member_id: MemberId,
    pub handle: String,
    pub display_name: String,
    pub group_id: Option<GroupId>,
    pub group_name: Option<String>,
    pub total_score: i64,
    pub rank: u32,
}

/// Sorts tallies and assigns ranks.
pub fn rank_tallies(mut tallies: Vec<MemberTally>, mode: RankingMode) -> Vec<LeaderboardEntry> {
    tallies.sort_by(|left, right| {
        right
            .total_score
            .cmp(&left.total_score)
            .then_with(|| right.has_scores().cmp(&left.has_scores()))
            .then_with(|| left.created_seq.cmp(&right.created_seq))
    });

    let mut ranked = Vec::with_capacity(tallies.len());
    let mut previous_total = None;
    let mut rank = 0u32;
    for (index, tally) in tallies.into_iter().enumerate() {
        rank = match mode {
            RankingMode::Sequential => index as u32 + 1,
            RankingMode::Dense if previous_total == Some(tally.total_score) => rank,
            RankingMode::Dense => rank + 1,
        };
        previous_total = Some(tally.total_score);
        ranked.push(LeaderboardEntry {
            member_id: tally.member_id,
            handle: tally.handle,
            display_name: tally.display_name,
            group_id: tally.group_id,
            group_name: tally.group_name,
            total_score: tally.total_score,
            rank,
        });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::{rank_tallies, MemberTally, RankingMode};
    use uuid::Uuid;

    fn tally(handle: &str, created_seq: i64, total_score: i64) -> MemberTally {
        scored(handle, created_seq, total_score, i64::from(total_score != 0))
    }

    fn scored(handle: &str, created_seq: i64, total_score: i64, score_count: i64) -> MemberTally {
        MemberTally {
            member_id: Uuid::new_v4(),
            handle: handle.to_string(),
            display_name: handle.to_uppercase(),
            group_id: None,
            group_name: None,
            created_seq,
            total_score,
            score_count,
        }
    }

    fn handles_and_ranks(tallies: Vec<MemberTally>, mode: RankingMode) -> Vec<(String, u32)> {
        rank_tallies(tallies, mode)
            .into_iter()
            .map(|entry| (entry.handle, entry.rank))
            .collect()
    }

    #[test]
    fn sequential_breaks_ties_by_creation_order() {
        let ranked = handles_and_ranks(
            vec![
                tally("late", 3, 10),
                tally("top", 4, 25),
                tally("early", 1, 10),
                tally("zero", 2, 0),
            ],
            RankingMode::Sequential,
        );
        assert_eq!(
            ranked,
            vec![
                ("top".to_string(), 1),
                ("early".to_string(), 2),
                ("late".to_string(), 3),
                ("zero".to_string(), 4),
            ]
        );
    }

    #[test]
    fn dense_shares_rank_for_equal_totals() {
        let ranked = handles_and_ranks(
            vec![
                tally("a", 1, 10),
                tally("b", 2, 10),
                tally("c", 3, -5),
                tally("d", 4, 30),
            ],
            RankingMode::Dense,
        );
        assert_eq!(
            ranked,
            vec![
                ("d".to_string(), 1),
                ("a".to_string(), 2),
                ("b".to_string(), 2),
                ("c".to_string(), 3),
            ]
        );
    }

    #[test]
    fn unscored_members_follow_net_zero_members() {
        let tallies = vec![
            scored("unscored", 1, 0, 0),
            scored("net_zero", 2, 0, 2),
            scored("negative", 3, -1, 1),
        ];
        let expected = vec![
            ("net_zero".to_string(), 1),
            ("unscored".to_string(), 2),
            ("negative".to_string(), 3),
        ];
        assert_eq!(
            handles_and_ranks(tallies.clone(), RankingMode::Sequential),
            expected
        );
        assert_eq!(
            handles_and_ranks(tallies, RankingMode::Dense),
            vec![
                ("net_zero".to_string(), 1),
                ("unscored".to_string(), 1),
                ("negative".to_string(), 2),
            ]
        );
    }

    #[test]
    fn input_order_does_not_change_result() {
        let forward = vec![tally("a", 1, 5), tally("b", 2, 5), tally("c", 3, 7)];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            rank_tallies(forward, RankingMode::Sequential),
            rank_tallies(backward, RankingMode::Sequential)
        );
    }

    #[test]
    fn empty_input_yields_empty_board() {
        assert!(rank_tallies(Vec::new(), RankingMode::Dense).is_empty());
    }
}
