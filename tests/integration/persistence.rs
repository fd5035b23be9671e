//! Cascades through the JSON file store.
//!
//! These tests write schedule documents by hand, run the engine against
//! them through `JsonStore`, and read the file back.

use std::fs;

use tempfile::TempDir;

use cascade::core::{ProjectId, ScheduleId, TaskId};
use cascade::schedule::AbandonReason;
use cascade::{move_task, run_cascade, Config, JsonStore, ScheduleStore};

use crate::fixtures::{span, ScheduleFixture};

/// A hand-written schedule: Excavation → Foundation (FS, lag 1) and
/// Excavation → Survey with a dependency type the engine doesn't know.
fn write_document(path: &std::path::Path) -> (ScheduleId, [TaskId; 3]) {
    let project = ProjectId::new();
    let schedule = ScheduleId::new();
    let ids = [TaskId::new(), TaskId::new(), TaskId::new()];
    let doc = format!(
        r#"{{
  "projects": [{{"id": "{project}", "name": "Bayside", "start_date": "2024-05-01",
    "schedule_id": "{schedule}"}}],
  "schedules": [{{"id": "{schedule}", "project_id": "{project}"}}],
  "tasks": [
    {{"id": "{a}", "schedule_id": "{schedule}", "name": "Excavation", "duration_days": 3,
      "start_date": "2024-05-01", "end_date": "2024-05-03", "updated_at": "2024-04-01T08:00:00Z"}},
    {{"id": "{b}", "schedule_id": "{schedule}", "name": "Foundation", "duration_days": 5,
      "start_date": "2024-05-05", "end_date": "2024-05-09",
      "constraint": {{"type": "START_NO_EARLIER", "date": "2024-05-05"}},
      "updated_at": "2024-04-01T08:00:00Z"}},
    {{"id": "{c}", "schedule_id": "{schedule}", "name": "Survey",
      "updated_at": "2024-04-01T08:00:00Z"}}
  ],
  "dependencies": [
    {{"source": "{a}", "target": "{b}", "type": "finish_to_start", "lag_days": 1}},
    {{"source": "{a}", "target": "{c}", "type": "lead_lag"}}
  ]
}}"#,
        project = project,
        schedule = schedule,
        a = ids[0],
        b = ids[1],
        c = ids[2],
    );
    fs::write(path, doc).unwrap();
    (schedule, ids)
}

/// Test: Move persisted through the file
/// Given a schedule file with Excavation → Foundation FS lag 1
/// When Excavation slips four days
/// Then both tasks are rewritten on disk and the unknown edge is reported
#[test]
fn test_move_persists_and_reports_unknown_edge() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("schedule.json");
    let (schedule, [a, b, c]) = write_document(&path);

    let mut store = JsonStore::open(&path).unwrap();
    let report = move_task(
        &mut store,
        a,
        span("2024-05-05", "2024-05-07"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.updated_ids(), vec![b]);
    assert_eq!(report.abandoned.len(), 1);
    assert_eq!(report.abandoned[0].task_id, c);
    assert_eq!(
        report.abandoned[0].reason,
        AbandonReason::UnrecognizedDependency { source: a }
    );

    let reopened = JsonStore::open(&path).unwrap();
    assert_eq!(reopened.get_task(a).unwrap().span(), Some(span("2024-05-05", "2024-05-07")));
    assert_eq!(reopened.get_task(b).unwrap().span(), Some(span("2024-05-09", "2024-05-13")));
    assert!(reopened.get_task(c).unwrap().span().is_none());
}

/// Test: Snapshot survives a save and reload
/// Given a chain built in memory
/// When it is written to a file and reopened
/// Then cascading the reopened store matches cascading the original
#[test]
fn test_reopened_store_cascades_the_same() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("chain.json");
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let (a, d) = (fx.id("A"), fx.id("D"));

    JsonStore::create(&path, fx.store).unwrap();
    let mut store = JsonStore::open(&path).unwrap();
    assert_eq!(store.inner().graph().dependency_count(), 3);
    assert!(store.inner().graph().is_acyclic());
move_task(&mut store, a, span("2024-01-11", "2024-01-11"), schedule, &Config::default()).unwrap();

    let reopened = JsonStore::open(&path).unwrap();
    assert_eq!(reopened.get_task(d).unwrap().span(), Some(span("2024-01-14", "2024-01-14")));
}

/// Test: Dangling dependency
/// Given a document whose dependency names a task that doesn't exist
/// When it is opened
/// Then loading fails instead of silently dropping the edge
#[test]
fn test_dangling_dependency_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    let doc = format!(
        r#"{{"dependencies": [{{"source": "{}", "target": "{}"}}]}}"#,
        TaskId::new(),
        TaskId::new()
    );
    fs::write(&path, doc).unwrap();

    assert!(matches!(JsonStore::open(&path), Err(cascade::Error::TaskNotFound(_))));
}

/// Test: Retry after a failed file write
/// Given A→B→C→D in a file store whose temp file path is blocked
/// When A is cascaded, the path is cleared, and the cascade is re-run
/// Then the first run leaves B's dates alone in memory and on disk, and the
/// re-run writes B, C and D
#[test]
fn test_failed_write_can_be_retried() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("chain.json");
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let (a, b, c, d) = (fx.id("A"), fx.id("B"), fx.id("C"), fx.id("D"));
    let mut store = JsonStore::create(&path, fx.store).unwrap();
    let blocker = path.with_extension("json.tmp");
    fs::create_dir(&blocker).unwrap();

    let moved = span("2024-01-10", "2024-01-10");
    let report = run_cascade(&mut store, a, moved, schedule, &Config::default()).unwrap();

    assert!(report.updates.is_empty());
    assert_eq!(report.abandoned.len(), 1);
    assert_eq!(report.abandoned[0].task_id, b);
    assert!(matches!(report.abandoned[0].reason, AbandonReason::WriteFailed(_)));
    assert_eq!(store.get_task(b).unwrap().span(), Some(span("2024-01-02", "2024-01-02")));
    let on_disk = JsonStore::open(&path).unwrap();
    assert_eq!(on_disk.get_task(b).unwrap().span(), Some(span("2024-01-02", "2024-01-02")));

    fs::remove_dir(&blocker).unwrap();
    let retry = run_cascade(&mut store, a, moved, schedule, &Config::default()).unwrap();

    assert_eq!(retry.updated_ids(), vec![b, c, d]);
    assert!(retry.is_complete());
    let reopened = JsonStore::open(&path).unwrap();
    assert_eq!(reopened.get_task(c).unwrap().span(), Some(span("2024-01-12", "2024-01-12")));
}
