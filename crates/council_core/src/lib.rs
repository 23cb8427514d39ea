//! Role and scoring integrity engine for a student council.
//!
//! Owns the hierarchy invariants, the append-only role audit log, the group
//! change guard, the score ledger and the leaderboard. Authentication and
//! permission checks happen in the caller.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::audit::{RoleChangeLogEntry, RoleChangeLogId};
pub use model::hierarchy::{HierarchySnapshot, InvariantViolation, RoleProposal};
pub use model::leaderboard::{LeaderboardEntry, RankingMode};
pub use model::member::{
    Department, DepartmentId, Group, GroupId, Member, MemberId, Role, RoleAssignment,
};
pub use model::score::{NewScore, ScoreEntry, ScoreId, ScorePatch};
pub use model::validation::{ValidationError, SCORE_ABS_MAX};
pub use repo::directory_repo::{MemberListQuery, PresidentBootstrap, SqliteDirectoryRepository};
pub use repo::group_repo::{GroupChangeOutcome, SqliteGroupRepository, GROUP_CHANGE_LIMIT};
pub use repo::leaderboard_repo::SqliteLeaderboardRepository;
pub use repo::role_repo::{RoleChangeOutcome, SqliteRoleRepository};
pub use repo::score_repo::SqliteScoreRepository;
pub use repo::{EntityRef, RepoError, RepoResult};
pub use service::directory_service::DirectoryService;
pub use service::group_service::GroupService;
pub use service::leaderboard_service::{LeaderboardQuery, LeaderboardService};
pub use service::role_service::{AssignRoleRequest, RoleService};
pub use service::score_service::ScoreService;

pub use rusqlite::Connection;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
