#![allow(dead_code)]

use council_core::{
    Connection, DepartmentId, DirectoryService, GroupId, GroupService, LeaderboardService,
    Member, RoleService, ScoreService, SqliteDirectoryRepository, SqliteGroupRepository,
    SqliteLeaderboardRepository, SqliteRoleRepository, SqliteScoreRepository,
};

pub fn directory(conn: &Connection) -> DirectoryService<SqliteDirectoryRepository<'_>> {
    DirectoryService::new(SqliteDirectoryRepository::try_new(conn).unwrap())
}

pub fn roles(conn: &Connection) -> RoleService<SqliteRoleRepository<'_>> {
    RoleService::new(SqliteRoleRepository::try_new(conn).unwrap())
}

pub fn groups(conn: &Connection) -> GroupService<SqliteGroupRepository<'_>> {
    GroupService::new(SqliteGroupRepository::try_new(conn).unwrap())
}

pub fn scores(conn: &Connection) -> ScoreService<SqliteScoreRepository<'_>> {
    ScoreService::new(SqliteScoreRepository::try_new(conn).unwrap())
}

pub fn leaderboard(conn: &Connection) -> LeaderboardService<SqliteLeaderboardRepository<'_>> {
    LeaderboardService::new(SqliteLeaderboardRepository::try_new(conn).unwrap())
}

pub fn president(conn: &Connection) -> Member {
    directory(conn)
        .bootstrap_president("president", "The President")
        .unwrap()
        .president
}

pub fn register(conn: &Connection, handle: &str, group: Option<&str>) -> Member {
    let group_id = group.map(|name| group_id(conn, name));
    directory(conn)
        .register_member(handle, &format!("Member {handle}"), group_id)
        .unwrap()
}

pub fn department_id(conn: &Connection, name: &str) -> DepartmentId {
    directory(conn).department_by_name(name).unwrap().unwrap().id
}

pub fn group_id(conn: &Connection, name: &str) -> GroupId {
    directory(conn).group_by_name(name).unwrap().unwrap().id
}

pub fn audit_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM role_change_logs;", [], |row| row.get(0))
        .unwrap()
}
