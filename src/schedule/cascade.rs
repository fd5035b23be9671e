//! Cascade propagation of date changes through the dependency graph.
//!
//! When a task moves, every task reachable from it along dependency edges
//! is recomputed breadth-first and written back immediately. The walk is
//! best-effort and not transactional: a failed lookup or write abandons
//! that branch only, and everything written before it stays written.
//!
//! Each task is updated at most once per run. The visited set stops cycles
//! from looping, and also means a task reachable along two paths (a
//! diamond) is resolved from whichever predecessor changes it first.

use std::collections::{HashSet, VecDeque};

use crate::core::dates::DateSpan;
use crate::core::{DependencyType, ScheduleId, TaskId};
use crate::error::{Error, Result};
use crate::schedule::calculator::successor_span;
use crate::schedule::constraint::apply_constraint;
use crate::store::{DependencyEdge, ScheduleStore, UpdateOutcome};
use crate::{clog, clog_debug, clog_trace, clog_warn};

/// A task whose dates were written during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskUpdate {
    pub id: TaskId,
    pub span: DateSpan,
    /// Dates before the write, if the task was scheduled.
    pub previous: Option<DateSpan>,
}

/// Why a branch of the walk stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbandonReason {
    /// Listing the task's outgoing dependencies failed.
    EdgeLookupFailed(String),
    /// Writing the task's new dates failed.
    WriteFailed(String),
    /// The stored dates changed under us (compare-and-swap only).
    Conflict { current: Option<DateSpan> },
    /// The edge into the task has a type the engine doesn't know.
    UnrecognizedDependency { source: TaskId },
    /// The computed dates fall outside the calendar.
    DateOutOfRange(String),
}

impl std::fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbandonReason::EdgeLookupFailed(e) => write!(f, "dependency lookup failed: {}", e),
            AbandonReason::WriteFailed(e) => write!(f, "write failed: {}", e),
            AbandonReason::Conflict { current: Some(span) } => {
                write!(f, "conflict: stored dates changed to {}", span)
            }
            AbandonReason::Conflict { current: None } => {
                write!(f, "conflict: stored dates were cleared")
            }
            AbandonReason::UnrecognizedDependency { source } => {
                write!(f, "unrecognized dependency type on edge from {}", source)
            }
            AbandonReason::DateOutOfRange(e) => write!(f, "{}", e),
        }
    }
}

/// A branch that was not completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonedBranch {
    pub task_id: TaskId,
    pub reason: AbandonReason,
}

/// Outcome of one cascade run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// The moved task's own write, when the run started with a move.
    pub moved: Option<TaskUpdate>,
    /// Dependent tasks written, in breadth-first order.
    pub updates: Vec<TaskUpdate>,
    pub abandoned: Vec<AbandonedBranch>,
}

impl CascadeReport {
    /// True when no branch was abandoned.
    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }

    pub fn updated_ids(&self) -> Vec<TaskId> {
        self.updates.iter().map(|u| u.id).collect()
    }
}

/// Breadth-first date propagator over a [`ScheduleStore`].
pub struct CascadePropagator<'a, S: ScheduleStore> {
    store: &'a mut S,
    compare_and_swap: bool,
}

impl<'a, S: ScheduleStore> CascadePropagator<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            compare_and_swap: false,
        }
    }

    /// Make every write conditional on the dates read just before it.
    pub fn with_compare_and_swap(mut self, enabled: bool) -> Self {
        self.compare_and_swap = enabled;
        self
    }

    /// Propagate a move of `task` to `span` through its dependents.
    ///
    /// `task` itself is not written; its new dates seed the walk. It must
    /// exist and belong to `schedule`.
    pub fn run(
        &mut self,
        task: TaskId,
        span: DateSpan,
        schedule: ScheduleId,
    ) -> Result<CascadeReport> {
        check_span(span)?;
        self.store.get_schedule(schedule)?;
        let seed = self.store.get_task(task)?;
        if seed.schedule_id != schedule {
            return Err(Error::CascadeAborted {
                task,
                schedule,
                reason: format!("task belongs to schedule {}", seed.schedule_id),
            });
        }

        clog!(
            "Cascade: task {} moved to {} in schedule {}",
            task.short(),
            span,
            schedule.short()
        );

        let mut report = CascadeReport::default();
        self.walk(task, span, schedule, &mut report);

        clog!(
            "Cascade: {} task(s) updated, {} branch(es) abandoned",
            report.updates.len(),
            report.abandoned.len()
        );
        Ok(report)
    }

    /// Like [`run`](Self::run), but only the new end date is known; the start
    /// is taken from the task's stored dates.
    ///
    /// Prefer `run` with both dates: if the start changed too, this silently
    /// uses the old one.
    pub fn run_from_stored_start(
        &mut self,
        task: TaskId,
        new_end: chrono::NaiveDate,
        schedule: ScheduleId,
    ) -> Result<CascadeReport> {
        let stored = self.store.get_task(task).map_err(|e| Error::CascadeAborted {
            task,
            schedule,
            reason: format!("could not read stored start date: {}", e),
        })?;
        let start = stored.start_date.ok_or_else(|| Error::CascadeAborted {
            task,
            schedule,
            reason: "task has no stored start date".to_string(),
        })?;

        clog_warn!(
            "Cascade: no start date given for task {}; using stored start {}",
            task.short(),
            start
        );
        self.run(task, DateSpan::new(start, new_end), schedule)
    }

    /// Write `task`'s new dates, then cascade from it.
    ///
    /// Failing to write the moved task is a hard error: nothing downstream
    /// has been touched yet, so the caller can simply retry.
    pub fn move_task(
        &mut self,
        task: TaskId,
        span: DateSpan,
        schedule: ScheduleId,
    ) -> Result<CascadeReport> {
        check_span(span)?;
        self.store.get_schedule(schedule)?;

        let abort = |reason: String| Error::CascadeAborted {
            task,
            schedule,
            reason,
        };

        let current = self
            .store
            .get_task(task)
            .map_err(|e| abort(format!("could not read task: {}", e)))?;
        if current.schedule_id != schedule {
            return Err(abort(format!(
                "task belongs to schedule {}",
                current.schedule_id
            )));
        }

        let previous = current.span();
        let expected = if self.compare_and_swap { previous } else { None };
        match self.store.update_task_dates(task, span, expected) {
            Ok(UpdateOutcome::Applied) => {}
            Ok(UpdateOutcome::Conflict { .. }) => {
                return Err(abort("stored dates changed before the move".to_string()))
            }
            Err(e) => return Err(abort(format!("could not write moved task: {}", e))),
        }

        let mut report = self.run(task, span, schedule)?;
        report.moved = Some(TaskUpdate {
            id: task,
            span,
            previous,
        });
        Ok(report)
    }

    fn walk(
        &mut self,
        root: TaskId,
        root_span: DateSpan,
        schedule: ScheduleId,
        report: &mut CascadeReport,
    ) {
        let mut queue: VecDeque<(TaskId, DateSpan)> = VecDeque::new();
        let mut visited: HashSet<TaskId> = HashSet::new();

        queue.push_back((root, root_span));
        visited.insert(root);

        while let Some((current, current_span)) = queue.pop_front() {
            let edges = match self.store.list_dependencies_by_source(current) {
                Ok(edges) => edges,
                Err(e) => {
                    clog_warn!(
                        "Cascade: listing dependents of {} failed, abandoning branch: {}",
                        current.short(),
                        e
                    );
                    report.abandoned.push(AbandonedBranch {
                        task_id: current,
                        reason: AbandonReason::EdgeLookupFailed(e.to_string()),
                    });
                    continue;
                }
            };

            for edge in edges {
                let target = edge.target_task_id;
                if visited.contains(&target) {
                    clog_debug!(
                        "Cascade: {} already resolved this run, skipping edge from {}",
                        target.short(),
                        current.short()
                    );
                    continue;
                }
                if edge.target_schedule_id != schedule {
                    clog_warn!(
                        "Cascade: edge {} -> {} leaves schedule {}, skipping",
                        current.short(),
                        target.short(),
                        schedule.short()
                    );
                    continue;
                }

                let resolved = match self.resolve_edge(current, current_span, &edge) {
                    Ok(span) => span,
                    Err(reason) => {
                        clog_warn!("Cascade: task {} skipped: {}", target.short(), reason);
                        report.abandoned.push(AbandonedBranch {
                            task_id: target,
                            reason,
                        });
                        continue;
                    }
                };

                if edge.target_current == Some(resolved) {
                    clog_trace!("Cascade: {} unchanged at {}", target.short(), resolved);
                    continue;
                }

                let expected = if self.compare_and_swap {
                    edge.target_current
                } else {
                    None
                };
                match self.store.update_task_dates(target, resolved, expected) {
                    Ok(UpdateOutcome::Applied) => {
                        clog_debug!(
                            "Cascade: {} {:?} -> {} via {} from {}",
                            target.short(),
                            edge.target_current,
                            resolved,
                            edge.dependency_type,
                            current.short()
                        );
                        visited.insert(target);
                        queue.push_back((target, resolved));
                        report.updates.push(TaskUpdate {
                            id: target,
                            span: resolved,
                            previous: edge.target_current,
                        });
                    }
                    Ok(UpdateOutcome::Conflict { current: stored }) => {
                        clog_warn!(
                            "Cascade: {} changed concurrently, abandoning branch",
                            target.short()
                        );
                        report.abandoned.push(AbandonedBranch {
                            task_id: target,
                            reason: AbandonReason::Conflict { current: stored },
                        });
                    }
                    Err(e) => {
                        clog_warn!(
                            "Cascade: writing {} failed, abandoning branch: {}",
                            target.short(),
                            e
                        );
                        report.abandoned.push(AbandonedBranch {
                            task_id: target,
                            reason: AbandonReason::WriteFailed(e.to_string()),
                        });
                    }
                }
            }
        }
    }

    /// Dependency calculation followed by constraint correction.
    fn resolve_edge(
        &self,
        source: TaskId,
        source_span: DateSpan,
        edge: &DependencyEdge,
    ) -> std::result::Result<DateSpan, AbandonReason> {
        let duration = edge.target_duration_or_default();
        let provisional = match successor_span(
            source_span,
            edge.dependency_type,
            edge.lag_days,
            duration,
        ) {
            Ok(Some(span)) => span,
            Ok(None) => {
                debug_assert_eq!(edge.dependency_type, DependencyType::Unrecognized);
                return Err(AbandonReason::UnrecognizedDependency { source });
            }
            Err(e) => return Err(AbandonReason::DateOutOfRange(e.to_string())),
        };

        let resolved = apply_constraint(edge.target_constraint.as_ref(), provisional, duration)
            .map_err(|e| AbandonReason::DateOutOfRange(e.to_string()))?;
        if resolved != provisional {
            clog_trace!(
                "Cascade: constraint moved {} from {} to {}",
                edge.target_task_id.short(),
                provisional,
                resolved
            );
        }
        Ok(resolved)
    }
}

fn check_span(span: DateSpan) -> Result<()> {
    if span.end < span.start {
        return Err(Error::Validation(format!(
            "end date precedes start date: {}",
            span
        )));
    }
    Ok(())
}
