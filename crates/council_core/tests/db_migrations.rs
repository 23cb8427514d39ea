use council_core::db::migrations::latest_version;
use council_core::db::{open_db, open_db_in_memory, DbError};
use council_core::{RepoError, SqliteRoleRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "departments",
        "member_groups",
        "members",
        "role_change_logs",
        "scores",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reference_data_is_seeded() {
    let conn = open_db_in_memory().unwrap();

    let departments: Vec<String> = names(&conn, "SELECT name FROM departments ORDER BY name;");
    assert_eq!(
        departments,
        [
            "academic_enhancement_board",
            "activity_department",
            "hr_management",
            "sports_department",
        ]
    );
    let groups: Vec<String> = names(&conn, "SELECT name FROM member_groups ORDER BY name;");
    assert_eq!(groups, ["G1", "G2", "G3"]);
}

#[test]
fn reopening_file_database_is_idempotent_and_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("council.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let journal_mode: String = second
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_ascii_lowercase(), "wal");
    let seeded: i64 = second
        .query_row("SELECT COUNT(*) FROM member_groups;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seeded, 3);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteRoleRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn role_change_log_rejects_update_and_delete() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO members (member_uuid, handle, display_name) VALUES ('m-1', 'alice', 'Alice');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO role_change_logs (log_uuid, member_uuid, new_role, actor_uuid)
         VALUES ('l-1', 'm-1', 'member', 'm-1');",
        [],
    )
    .unwrap();

    let update = conn.execute("UPDATE role_change_logs SET reason = 'edited';", []);
    assert!(update.unwrap_err().to_string().contains("append-only"));
    let delete = conn.execute("DELETE FROM role_change_logs;", []);
    assert!(delete.unwrap_err().to_string().contains("append-only"));
}

#[test]
fn storage_rejects_a_second_president() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO members (member_uuid, handle, display_name, role)
         VALUES ('p-1', 'first', 'First', 'president');",
        [],
    )
    .unwrap();

    let second = conn.execute(
        "INSERT INTO members (member_uuid, handle, display_name, role)
         VALUES ('p-2', 'second', 'Second', 'president');",
        [],
    );
    assert!(second.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn names(conn: &Connection, sql: &str) -> Vec<String> {
    let mut stmt = conn.prepare(sql).unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.collect::<Result<_, _>>().unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
