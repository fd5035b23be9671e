//! Cascade propagation through a store.
//!
//! These tests drive the propagator through the public entry points and
//! check what ends up persisted, including partial runs where the store
//! fails part-way through.

use cascade::core::{
    Constraint, ConstraintKind, DependencyType, Project, ProjectId, ScheduleId, Task,
};
use cascade::schedule::{AbandonReason, CascadePropagator};
use cascade::{move_task, run_cascade, run_cascade_from_stored_start, Config, ScheduleStore};

use crate::fixtures::{date, span, FlakyStore, ScheduleFixture};

/// Test: Transitive shift
/// Given A→B→C→D, FS lag 0, one day each
/// When A moves three days later
/// Then B, C and D each move three days and are reported in walk order
#[test]
fn test_chain_shifts_every_dependent() {
    let mut fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let a = fx.id("A");

    let report = move_task(
        &mut fx.store,
        a,
        span("2024-01-04", "2024-01-04"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.updated_ids(), vec![fx.id("B"), fx.id("C"), fx.id("D")]);
    assert_eq!(fx.span_of("A"), Some(span("2024-01-04", "2024-01-04")));
    assert_eq!(fx.span_of("B"), Some(span("2024-01-05", "2024-01-05")));
    assert_eq!(fx.span_of("C"), Some(span("2024-01-06", "2024-01-06")));
    assert_eq!(fx.span_of("D"), Some(span("2024-01-07", "2024-01-07")));
    for update in &report.updates {
        let previous = update.previous.unwrap();
        assert_eq!((update.span.start - previous.start).num_days(), 3);
    }
}

/// Test: Idempotence
/// Given a chain that has already been cascaded
/// When the same move is cascaded again
/// Then nothing is written
#[test]
fn test_second_cascade_changes_nothing() {
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let a = fx.id("A");
    let mut store = FlakyStore::new(fx.store);
    let moved = span("2024-01-10", "2024-01-10");
    let config = Config::default();

    let first = run_cascade(&mut store, a, moved, schedule, &config).unwrap();
    assert_eq!(first.updates.len(), 3);

    let before = store.inner.to_snapshot();
    let second = run_cascade(&mut store, a, moved, schedule, &config).unwrap();

    assert!(second.updates.is_empty());
    assert!(second.is_complete());
    assert_eq!(store.inner.to_snapshot(), before);
}

/// Test: Cycle safety
/// Given A→B→C→A
/// When A is cascaded
/// Then the walk terminates and each task is written at most once
#[test]
fn test_cycle_terminates() {
    let fx = ScheduleFixture::cycle("2024-01-01");
    let schedule = fx.schedule();
    let (a, b, c) = (fx.id("A"), fx.id("B"), fx.id("C"));
    let mut store = FlakyStore::new(fx.store);

    let report = run_cascade(
        &mut store,
        a,
        span("2024-01-01", "2024-01-01"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.updated_ids(), vec![b, c]);
    assert_eq!(store.write_count(a), 0);
    assert_eq!(store.write_count(b), 1);
    assert_eq!(store.write_count(c), 1);
    assert!(report.is_complete());
}

/// Test: Constraint precedence
/// Given A→B FS where B must start on 2024-01-10, and B→C FS
/// When A ends on 2024-01-05
/// Then B starts on its constraint date and C follows B
#[test]
fn test_constraint_wins_and_propagates() {
    let mut fx = ScheduleFixture::new("2024-01-01");
    fx.task("A", 5, None);
    fx.constrained_task(
        "B",
        3,
        Constraint::new(ConstraintKind::MustStartOn, date("2024-01-10")),
    );
    fx.task("C", 2, None);
    fx.fs("A", "B");
    fx.fs("B", "C");
    let schedule = fx.schedule();
    let a = fx.id("A");
run_cascade(
    &mut fx.store,
    a,
    span("2024-01-01", "2024-01-05"),
    schedule,
    &Config::default(),
)
.unwrap();

    assert_eq!(fx.span_of("B"), Some(span("2024-01-10", "2024-01-12")));
    assert_eq!(fx.span_of("C"), Some(span("2024-01-13", "2024-01-14")));
}

/// Test: Mixed relations
/// Given A→B SS lag 2, A→C FF lag 1 and A→D SF lag 0
/// When A is placed on [2024-01-01, 2024-01-10]
/// Then each successor follows its own relation
#[test]
fn test_each_relation_in_one_walk() {
    let mut fx = ScheduleFixture::new("2024-01-01");
    fx.task("A", 10, None);
    fx.task("B", 5, None);
    fx.task("C", 4, None);
    fx.task("D", 2, None);
    fx.depend("A", "B", DependencyType::StartToStart, 2);
    fx.depend("A", "C", DependencyType::FinishToFinish, 1);
    fx.depend("A", "D", DependencyType::StartToFinish, 0);
    let schedule = fx.schedule();
    let a = fx.id("A");
run_cascade(
    &mut fx.store,
    a,
    span("2024-01-01", "2024-01-10"),
    schedule,
    &Config::default(),
)
.unwrap();

    assert_eq!(fx.span_of("B"), Some(span("2024-01-03", "2024-01-07")));
    assert_eq!(fx.span_of("C"), Some(span("2024-01-08", "2024-01-11")));
    assert_eq!(fx.span_of("D"), Some(span("2023-12-31", "2024-01-01")));
}

/// Test: Diamond join
/// Given A→B→D and A→C→D
/// When A is cascaded
/// Then D is written once, from the first predecessor that reaches it
#[test]
fn test_diamond_join_resolved_once() {
    let mut fx = ScheduleFixture::new("2024-01-01");
    fx.task("A", 1, None);
    fx.task("B", 1, None);
    fx.task("C", 3, None);
    fx.task("D", 1, None);
    fx.fs("A", "B");
    fx.fs("A", "C");
    fx.fs("B", "D");
    fx.fs("C", "D");
    let schedule = fx.schedule();
    let (a, d) = (fx.id("A"), fx.id("D"));
    let mut store = FlakyStore::new(fx.store);
run_cascade(&mut store, a, span("2024-01-03", "2024-01-03"), schedule, &Config::default()).unwrap();

    assert_eq!(store.write_count(d), 1);
    assert_eq!(store.get_task(d).unwrap().span(), Some(span("2024-01-05", "2024-01-05")));
}

/// Test: Edge lookup failure
/// Given A→B→C→D where listing B's dependents fails
/// When A is cascaded
/// Then B is written, the branch below B is abandoned, and C and D keep their dates
#[test]
fn test_edge_lookup_failure_abandons_branch() {
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let (a, b, c, d) = (fx.id("A"), fx.id("B"), fx.id("C"), fx.id("D"));
    let mut store = FlakyStore::new(fx.store);
    store.failing_lookups.insert(b);

    let report = run_cascade(
        &mut store,
        a,
        span("2024-01-04", "2024-01-04"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.updated_ids(), vec![b]);
    assert_eq!(report.abandoned.len(), 1);
    assert_eq!(report.abandoned[0].task_id, b);
    assert!(matches!(report.abandoned[0].reason, AbandonReason::EdgeLookupFailed(_)));
    assert_eq!(store.get_task(c).unwrap().span(), Some(span("2024-01-03", "2024-01-03")));
    assert_eq!(store.get_task(d).unwrap().span(), Some(span("2024-01-04", "2024-01-04")));
}

/// Test: Write failure on one branch
/// Given A→B and A→C where writing B fails
/// When A is cascaded
/// Then C is still written and B is reported as abandoned
#[test]
fn test_write_failure_keeps_other_branches() {
    let mut fx = ScheduleFixture::new("2024-01-01");
    fx.task("A", 1, None);
    fx.task("B", 1, None);
    fx.task("C", 1, None);
    fx.fs("A", "B");
    fx.fs("A", "C");
    let schedule = fx.schedule();
    let (a, b, c) = (fx.id("A"), fx.id("B"), fx.id("C"));
    let mut store = FlakyStore::new(fx.store);
    store.failing_writes.insert(b);

    let report = run_cascade(
        &mut store,
        a,
        span("2024-01-01", "2024-01-01"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.updated_ids(), vec![c]);
    assert!(!report.is_complete());
    assert!(matches!(report.abandoned[0].reason, AbandonReason::WriteFailed(_)));
    assert!(store.get_task(b).unwrap().span().is_none());

    // Once the store recovers a re-run finishes the job.
    store.failing_writes.clear();
    let retry = run_cascade(
        &mut store,
        a,
        span("2024-01-01", "2024-01-01"),
        schedule,
        &Config::default(),
    )
    .unwrap();
    assert_eq!(retry.updated_ids(), vec![b]);
}

/// Test: Compare-and-swap conflict
/// Given A→B→C where another writer moves B during the walk
/// When A is cascaded with compare-and-swap enabled
/// Then B's write is rejected, the branch is abandoned, and C is untouched
#[test]
fn test_compare_and_swap_conflict() {
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let (a, b, c) = (fx.id("A"), fx.id("B"), fx.id("C"));
    let mut store = FlakyStore::new(fx.store);
    store.contended.insert(b);

    let config = Config {
        compare_and_swap: true,
        ..Config::default()
    };
    let report = run_cascade(
        &mut store,
        a,
        span("2024-01-04", "2024-01-04"),
        schedule,
        &config,
    )
    .unwrap();

    assert!(report.updates.is_empty());
    assert_eq!(
        report.abandoned[0].reason,
        AbandonReason::Conflict {
            current: Some(span("2024-04-14", "2024-04-14"))
        }
    );
    assert_eq!(store.get_task(c).unwrap().span(), Some(span("2024-01-03", "2024-01-03")));
}

/// Test: Last writer wins without compare-and-swap
/// Given the same contended chain
/// When compare-and-swap is off
/// Then the cascade overwrites the other writer's dates
#[test]
fn test_last_writer_wins_by_default() {
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let (a, b) = (fx.id("A"), fx.id("B"));
    let mut store = FlakyStore::new(fx.store);
    store.contended.insert(b);

    let report = run_cascade(
        &mut store,
        a,
        span("2024-01-04", "2024-01-04"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert!(report.is_complete());
    assert_eq!(store.get_task(b).unwrap().span(), Some(span("2024-01-05", "2024-01-05")));
}

/// Test: Edge into another schedule
/// Given A in one project depending into a task of another project
/// When A is cascaded
/// Then the foreign task is left alone and the run is still complete
#[test]
fn test_edge_into_other_schedule_skipped() {
    let mut fx = ScheduleFixture::new("2024-01-01");
    fx.task("A", 1, None);
    let other = Project {
        id: ProjectId::new(),
        name: "Elm Court".to_string(),
        start_date: None,
        schedule_id: ScheduleId::new(),
    };
    fx.store.add_project(other.clone()).unwrap();
    let foreign = fx.insert(Task::new(other.schedule_id, "Foreign").with_duration(1));
    fx.fs("A", "Foreign");
    let schedule = fx.schedule();
    let a = fx.id("A");

    let report = run_cascade(
        &mut fx.store,
        a,
        span("2024-01-01", "2024-01-01"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert!(report.updates.is_empty());
    assert!(report.is_complete());
    assert!(fx.store.get_task(foreign).unwrap().span().is_none());
}

/// Test: Stored-start fallback
/// Given A stored on [2024-01-01, 2024-01-02] and A→B FS
/// When only A's new end date is given
/// Then the stored start is kept and B follows the new end
#[test]
fn test_cascade_from_stored_start() {
    let mut fx = ScheduleFixture::new("2024-01-01");
    fx.task("A", 2, Some(span("2024-01-01", "2024-01-02")));
    fx.task("B", 1, None);
    fx.fs("A", "B");
    let schedule = fx.schedule();
    let a = fx.id("A");

    let report = run_cascade_from_stored_start(
        &mut fx.store,
        a,
        date("2024-01-05"),
        schedule,
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.updated_ids(), vec![fx.id("B")]);
    assert_eq!(fx.span_of("B"), Some(span("2024-01-06", "2024-01-06")));
}

/// Test: Failed root write
/// Given a store that cannot write A
/// When A is moved
/// Then the move is a hard error and no dependent is touched
#[test]
fn test_move_task_root_write_failure_is_hard_error() {
    let fx = ScheduleFixture::chain("2024-01-01");
    let schedule = fx.schedule();
    let (a, b) = (fx.id("A"), fx.id("B"));
    let mut store = FlakyStore::new(fx.store);
    store.failing_writes.insert(a);

    let err = CascadePropagator::new(&mut store)
        .move_task(a, span("2024-01-04", "2024-01-04"), schedule)
        .unwrap_err();

    assert!(matches!(
        err,
        cascade::Error::CascadeAborted { task, schedule: s, .. } if task == a && s == schedule
    ));
    assert_eq!(store.write_count(b), 0);
}
