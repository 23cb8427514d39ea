mod common;

use common::{department_id, leaderboard, president, register, scores};
use council_core::db::open_db_in_memory;
use council_core::{
    CoreError, EntityRef, LeaderboardQuery, NewScore, ScorePatch, ValidationError, SCORE_ABS_MAX,
};
use uuid::Uuid;

#[test]
fn create_records_negative_values_and_trims_reason() {
    let conn = open_db_in_memory().unwrap();
    let actor = president(&conn);
    let a = register(&conn, "alice", None);
    let dept = department_id(&conn, "sports_department");

    let entry = scores(&conn)
        .create_score(&NewScore {
            member_id: a.id,
            department_id: dept,
            value: -3,
            actor_id: actor.id,
            reason: Some("  late  ".to_string()),
        })
        .unwrap();

    assert_eq!(entry.member_id, a.id);
    assert_eq!(entry.department_id, dept);
    assert_eq!(entry.value, -3);
    assert_eq!(entry.reason.as_deref(), Some("late"));
    assert_eq!(entry.actor_id, actor.id);
    assert_eq!(entry.created_at, entry.updated_at);
}

#[test]
fn create_requires_existing_member_and_department() {
    let conn = open_db_in_memory().unwrap();
    let actor = president(&conn);
    let a = register(&conn, "alice", None);
    let dept = department_id(&conn, "hr_management");
    let service = scores(&conn);
    let missing_member = Uuid::new_v4();
    let missing_department = Uuid::new_v4();

    let err = service
        .create_score(&NewScore {
            member_id: missing_member,
            department_id: dept,
            value: 1,
            actor_id: actor.id,
            reason: None,
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(EntityRef::Member(id)) if id == missing_member));

    let err = service
        .create_score(&NewScore {
            member_id: a.id,
            department_id: missing_department,
            value: 1,
            actor_id: actor.id,
            reason: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound(EntityRef::Department(id)) if id == missing_department
    ));
    assert!(service.list_member_scores(a.id, None).unwrap().is_empty());
}

#[test]
fn update_changes_only_given_fields() {
    let conn = open_db_in_memory().unwrap();
    let actor = president(&conn);
    let a = register(&conn, "alice", None);
    let service = scores(&conn);
    let created = service
        .create_score(&NewScore {
            member_id: a.id,
            department_id: department_id(&conn, "activity_department"),
            value: 10,
            actor_id: actor.id,
            reason: Some("event".to_string()),
        })
        .unwrap();

    let value_only = service
        .update_score(
            created.id,
            &ScorePatch {
                value: Some(12),
                reason: None,
            },
        )
        .unwrap();
    assert_eq!(value_only.value, 12);
    assert_eq!(value_only.reason.as_deref(), Some("event"));

    let reason_only = service
        .update_score(
            created.id,
            &ScorePatch {
                value: None,
                reason: Some("event, corrected".to_string()),
            },
        )
        .unwrap();
    assert_eq!(reason_only.value, 12);
    assert_eq!(reason_only.reason.as_deref(), Some("event, corrected"));
}

#[test]
fn empty_patch_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = scores(&conn);

    let err = service
        .update_score(
            Uuid::new_v4(),
            &ScorePatch {
                value: None,
                reason: Some("   ".to_string()),
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::EmptyScoreUpdate)
    ));
}

#[test]
fn update_and_delete_of_missing_score_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = scores(&conn);
    let id = Uuid::new_v4();

    let update = service
        .update_score(
            id,
            &ScorePatch {
                value: Some(1),
                reason: None,
            },
        )
        .unwrap_err();
    assert!(matches!(update, CoreError::NotFound(EntityRef::Score(found)) if found == id));

    let delete = service.delete_score(id).unwrap_err();
    assert!(matches!(delete, CoreError::NotFound(EntityRef::Score(found)) if found == id));
}

#[test]
fn delete_removes_entry() {
    let conn = open_db_in_memory().unwrap();
    let actor = president(&conn);
    let a = register(&conn, "alice", None);
    let service = scores(&conn);
    let created = service
        .create_score(&NewScore {
            member_id: a.id,
            department_id: department_id(&conn, "sports_department"),
            value: 4,
            actor_id: actor.id,
            reason: None,
        })
        .unwrap();

    service.delete_score(created.id).unwrap();

    assert_eq!(service.get_score(created.id).unwrap(), None);
    assert!(matches!(
        service.delete_score(created.id),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn listings_are_newest_first_and_scoped() {
    let conn = open_db_in_memory().unwrap();
    let actor = president(&conn);
    let a = register(&conn, "alice", None);
    let b = register(&conn, "bob", None);
    let sports = department_id(&conn, "sports_department");
    let hr = department_id(&conn, "hr_management");
    let service = scores(&conn);

    let mut ids = Vec::new();
    for (member_id, department_id, value) in [
        (a.id, sports, 1),
        (b.id, sports, 2),
        (a.id, hr, 3),
        (a.id, sports, 4),
    ] {
        let entry = service
            .create_score(&NewScore {
                member_id,
                department_id,
                value,
                actor_id: actor.id,
                reason: None,
            })
            .unwrap();
        ids.push(entry.id);
    }

    let alice: Vec<i64> = service
        .list_member_scores(a.id, None)
        .unwrap()
        .iter()
        .map(|entry| entry.value)
        .collect();
    assert_eq!(alice, vec![4, 3, 1]);

    let sports_scores: Vec<i64> = service
        .list_department_scores(sports, None)
        .unwrap()
        .iter()
        .map(|entry| entry.value)
        .collect();
    assert_eq!(sports_scores, vec![4, 2, 1]);

    let latest = service.list_member_scores(a.id, Some(1)).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].id, ids[3]);
}

#[test]
fn values_beyond_bound_are_rejected_and_totals_stay_readable() {
    let conn = open_db_in_memory().unwrap();
    let actor = president(&conn);
    let a = register(&conn, "alice", None);
    let dept = department_id(&conn, "sports_department");
    let service = scores(&conn);
    let new_score = |value: i64| NewScore {
        member_id: a.id,
        department_id: dept,
        value,
        actor_id: actor.id,
        reason: None,
    };

    for value in [i64::MAX, SCORE_ABS_MAX + 1, -SCORE_ABS_MAX - 1, i64::MIN] {
        assert!(matches!(
            service.create_score(&new_score(value)),
            Err(CoreError::Validation(ValidationError::ScoreOutOfRange(found))) if found == value
        ));
    }
    assert!(service.list_member_scores(a.id, None).unwrap().is_empty());

    let top = service.create_score(&new_score(SCORE_ABS_MAX)).unwrap();
    service.create_score(&new_score(SCORE_ABS_MAX)).unwrap();
    assert!(matches!(
        service.update_score(
            top.id,
            &ScorePatch {
                value: Some(i64::MAX),
                reason: None,
            },
        ),
        Err(CoreError::Validation(ValidationError::ScoreOutOfRange(_)))
    ));
    assert_eq!(service.get_score(top.id).unwrap().unwrap().value, SCORE_ABS_MAX);

    let board = leaderboard(&conn)
        .compute_leaderboard(&LeaderboardQuery::default())
        .unwrap();
    assert_eq!(board[0].member_id, a.id);
    assert_eq!(board[0].total_score, 2 * SCORE_ABS_MAX);
}
