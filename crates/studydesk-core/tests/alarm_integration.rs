//! Alarm scanning over tasks stored in the database.

use chrono::{Duration, Utc};
use studydesk_core::alarm::{AlarmKind, AlarmScanner, ScheduledTask};
use studydesk_core::storage::{ChangeKind, Database, NewTask, Priority, Table, TaskPatch};

fn add(db: &Database, subject: &str, start_in: Duration, alarm: bool) -> String {
    let start = Utc::now() + start_in;
    db.create_task(
        "student",
        NewTask {
            subject_name: subject.into(),
            description: None,
            start_time: start,
            end_time: start + Duration::minutes(45),
            priority: Priority::Medium,
            alarm_enabled: alarm,
        },
    )
    .unwrap()
    .id
}

fn scheduled(db: &Database) -> Vec<ScheduledTask> {
    db.list_tasks("student")
        .unwrap()
        .iter()
        .map(ScheduledTask::from)
        .collect()
}

#[test]
fn stored_tasks_fire_once_each() {
    let db = Database::open_memory().unwrap();
    let soon = add(&db, "Algebra", Duration::minutes(4), true);
    let now_id = add(&db, "Latin", Duration::seconds(-10), true);
    add(&db, "Muted", Duration::minutes(2), false);
    add(&db, "Tomorrow", Duration::days(1), true);

    let mut scanner = AlarmScanner::default();
    let first = scanner.scan(Utc::now(), &scheduled(&db));
    assert_eq!(first.len(), 2);

    let latin = first.iter().find(|a| a.task_id == now_id).unwrap();
    assert_eq!(latin.kind, AlarmKind::Start);
    assert_eq!(latin.title(), "🔔 Time to Study: Latin");

    let algebra = first.iter().find(|a| a.task_id == soon).unwrap();
    assert!(matches!(algebra.kind, AlarmKind::PreAlert { minutes_remaining } if minutes_remaining == 4 || minutes_remaining == 3));

    assert!(scanner.scan(Utc::now(), &scheduled(&db)).is_empty());
    assert_eq!(scanner.notified().len(), 2);
}

#[test]
fn completing_a_task_silences_it() {
    let db = Database::open_memory().unwrap();
    let id = add(&db, "Essay", Duration::minutes(3), true);
    db.update_task(
        &id,
        TaskPatch {
            is_completed: Some(true),
            ..Default::default()
        },
    )
    .unwrap();

    let mut scanner = AlarmScanner::default();
    assert!(scanner.scan(Utc::now(), &scheduled(&db)).is_empty());
}

#[test]
fn late_opening_still_gets_start_alarm() {
    // Pre-alert window already passed unseen; start window still catches it.
    let db = Database::open_memory().unwrap();
    let id = add(&db, "Lab", Duration::seconds(-30), true);
    let mut scanner = AlarmScanner::default();
    let fired = scanner.scan(Utc::now(), &scheduled(&db));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].task_id, id);
    assert_eq!(fired[0].kind, AlarmKind::Start);
}

#[test]
fn change_feed_reports_task_mutations() {
    let db = Database::open_memory().unwrap();
    let mut changes = db.subscribe();
    let id = add(&db, "Geo", Duration::hours(1), true);
    db.update_task(
        &id,
        TaskPatch {
            alarm_enabled: Some(false),
            ..Default::default()
        },
    )
    .unwrap();

    let insert = changes.try_recv().unwrap();
    assert_eq!((insert.table, insert.kind), (Table::StudyTasks, ChangeKind::Insert));
    let update = changes.try_recv().unwrap();
    assert_eq!(update.kind, ChangeKind::Update);
    assert_eq!(update.id, id);
}
