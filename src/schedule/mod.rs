//! The scheduling engine: date arithmetic over dependency edges, constraint
//! correction, cascade propagation and initial auto-placement.
//!
//! Everything here works through a [`ScheduleStore`]; nothing touches
//! storage directly.

pub mod auto;
pub mod calculator;
pub mod cascade;
pub mod constraint;
pub mod durations;

pub use auto::{AutoScheduleReport, AutoScheduler, Placement, PlacementKind};
pub use calculator::successor_span;
pub use cascade::{AbandonReason, AbandonedBranch, CascadePropagator, CascadeReport, TaskUpdate};
pub use constraint::apply_constraint;
pub use durations::DurationResolver;

use chrono::NaiveDate;

use crate::config::Config;
use crate::core::{DateSpan, ProjectId, ScheduleId, TaskId};
use crate::error::Result;
use crate::store::ScheduleStore;

/// Place every unscheduled task of a project on the timeline.
pub fn run_auto_schedule<S: ScheduleStore>(
    store: &mut S,
    project: ProjectId,
    config: &Config,
) -> Result<AutoScheduleReport> {
    AutoScheduler::new(store, config).run(project)
}

/// Cascade a move of `task` to `span` through its dependents.
pub fn run_cascade<S: ScheduleStore>(
    store: &mut S,
    task: TaskId,
    span: DateSpan,
    schedule: ScheduleId,
    config: &Config,
) -> Result<CascadeReport> {
    CascadePropagator::new(store)
        .with_compare_and_swap(config.compare_and_swap)
        .run(task, span, schedule)
}

/// Cascade when only the new end date is known. See
/// [`CascadePropagator::run_from_stored_start`].
pub fn run_cascade_from_stored_start<S: ScheduleStore>(
    store: &mut S,
    task: TaskId,
    new_end: NaiveDate,
    schedule: ScheduleId,
    config: &Config,
) -> Result<CascadeReport> {
    CascadePropagator::new(store)
        .with_compare_and_swap(config.compare_and_swap)
        .run_from_stored_start(task, new_end, schedule)
}

/// Write a task's new dates, then cascade from it.
pub fn move_task<S: ScheduleStore>(
    store: &mut S,
    task: TaskId,
    span: DateSpan,
    schedule: ScheduleId,
    config: &Config,
) -> Result<CascadeReport> {
    CascadePropagator::new(store)
        .with_compare_and_swap(config.compare_and_swap)
        .move_task(task, span, schedule)
}
