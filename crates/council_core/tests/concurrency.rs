mod common;

use common::{department_id, directory, group_id, groups, president, register, roles, scores};
use council_core::db::open_db;
use council_core::{
    AssignRoleRequest, CoreError, GroupChangeOutcome, InvariantViolation, NewScore, Role,
};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 6;

fn count_heads(path: &Path, department: &str) -> i64 {
    let conn = open_db(path).unwrap();
    let department_id = department_id(&conn, department);
    conn.query_row(
        "SELECT COUNT(*) FROM members WHERE role = 'department_head' AND department_uuid = ?1;",
        [department_id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn concurrent_head_assignments_leave_one_head_and_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("council.db");
    let (actor_id, candidates, dept) = {
        let conn = open_db(&path).unwrap();
        let actor = president(&conn);
        let candidates: Vec<_> = (0..WORKERS)
            .map(|index| register(&conn, &format!("candidate-{index}"), None).id)
            .collect();
        (actor.id, candidates, department_id(&conn, "sports_department"))
    };

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = candidates
        .iter()
        .map(|&subject_id| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = roles(&conn);
                barrier.wait();
                service.assign_role(&AssignRoleRequest {
                    subject_id,
                    new_role: Role::DepartmentHead,
                    department_id: Some(dept),
                    actor_id,
                    reason: None,
                })
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => accepted += 1,
            Err(CoreError::InvariantViolation(InvariantViolation::DepartmentHeadConflict {
                ..
            })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(count_heads(&path, "sports_department"), 1);
    let conn = open_db(&path).unwrap();
    let head_entries: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM role_change_logs WHERE new_role = 'department_head';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(head_entries, 1);
}

#[test]
fn concurrent_group_changes_use_the_single_change_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("council.db");
    let (member_id, targets) = {
        let conn = open_db(&path).unwrap();
        let member = register(&conn, "alice", Some("G1"));
        let targets = vec![group_id(&conn, "G2"), group_id(&conn, "G3")];
        (member.id, targets)
    };

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|index| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            let target = targets[index % targets.len()];
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = groups(&conn);
                barrier.wait();
                service.set_group(member_id, target)
            })
        })
        .collect();

    let mut changed = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(GroupChangeOutcome::Changed(_)) => changed += 1,
            // A later worker may target the group the winner picked.
            Ok(GroupChangeOutcome::Unchanged(_)) => {}
            Err(CoreError::GroupChangeLimitExceeded { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(changed, 1);
    let conn = open_db(&path).unwrap();
    let stored = directory(&conn).get_member(member_id).unwrap();
    assert_eq!(stored.group_change_count, 1);
}

#[test]
fn score_writes_from_many_connections_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("council.db");
    let (actor_id, member_id, dept) = {
        let conn = open_db(&path).unwrap();
        let actor = president(&conn);
        let member = register(&conn, "alice", None);
        (actor.id, member.id, department_id(&conn, "activity_department"))
    };

    let handles: Vec<_> = (0..WORKERS)
        .map(|index| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                scores(&conn).create_score(&NewScore {
                    member_id,
                    department_id: dept,
                    value: index as i64 + 1,
                    actor_id,
                    reason: None,
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let entries = scores(&conn).list_member_scores(member_id, None).unwrap();
    assert_eq!(entries.len(), WORKERS);
    let total: i64 = entries.iter().map(|entry| entry.value).sum();
    assert_eq!(total, (1..=WORKERS as i64).sum::<i64>());
}
