//! Persistence port for schedules.
//!
//! The engine never talks to storage directly; it goes through
//! [`ScheduleStore`]. Two adapters ship with the crate:
//!
//! - [`MemoryStore`]: everything in memory, dependencies kept in a
//!   [`ScheduleGraph`](crate::core::ScheduleGraph).
//! - [`JsonStore`]: a `MemoryStore` that rewrites a JSON file after every
//!   mutation.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::core::{
    BudgetCategory, CategoryDefault, CategoryId, Constraint, DateSpan, Dependency,
    DependencyType, Project, ProjectId, Schedule, ScheduleId, Task, TaskId,
};
use crate::error::Result;

/// An outgoing dependency joined with what the engine needs to know about
/// its target task.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEdge {
    pub target_task_id: TaskId,
    pub dependency_type: DependencyType,
    pub lag_days: i64,
    pub target_duration: Option<u32>,
    pub target_constraint: Option<Constraint>,
    pub target_current: Option<DateSpan>,
    pub target_schedule_id: ScheduleId,
}

impl DependencyEdge {
    pub fn target_duration_or_default(&self) -> u32 {
        self.target_duration.filter(|d| *d > 0).unwrap_or(1)
    }
}

/// Result of a date write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The stored span no longer matched the expected one; nothing was written.
    Conflict { current: Option<DateSpan> },
}

/// A task to be created by the auto-scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub category_id: CategoryId,
    pub name: String,
    pub span: DateSpan,
    pub display_order: Option<i32>,
}

/// Everything a store holds, in a serializable form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub categories: Vec<BudgetCategory>,
    #[serde(default)]
    pub category_defaults: Vec<CategoryDefault>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// Storage operations consumed by the scheduling engine.
///
/// Each write is expected to be atomic on its own; there is no transaction
/// spanning several calls.
pub trait ScheduleStore {
    fn get_task(&self, id: TaskId) -> Result<Task>;

    fn get_schedule(&self, id: ScheduleId) -> Result<Schedule>;

    fn get_project(&self, id: ProjectId) -> Result<Project>;

    /// Every task of a schedule, scheduled or not, in insertion order.
    fn list_tasks(&self, schedule: ScheduleId) -> Result<Vec<Task>>;

    /// Every dependency whose source task belongs to `schedule`.
    fn list_dependencies(&self, schedule: ScheduleId) -> Result<Vec<Dependency>>;

    fn list_dependencies_by_source(&self, task: TaskId) -> Result<Vec<DependencyEdge>>;

    fn list_category_defaults(&self) -> Result<Vec<CategoryDefault>>;

    /// Budget categories of a project, in insertion order.
    fn list_budget_categories(&self, project: ProjectId) -> Result<Vec<BudgetCategory>>;

    fn list_tasks_by_category(&self, category: CategoryId) -> Result<Vec<Task>>;

    /// Tasks of a schedule that have a start date.
    fn list_scheduled_tasks(&self, schedule: ScheduleId) -> Result<Vec<Task>>;

    /// Write a task's dates and stamp its update time.
    ///
    /// A task without a duration takes the length of its first span.
    ///
    /// When `expected` is given the write only happens if the stored span
    /// still equals it.
    fn update_task_dates(
        &mut self,
        id: TaskId,
        span: DateSpan,
        expected: Option<DateSpan>,
    ) -> Result<UpdateOutcome>;

    fn insert_task(&mut self, task: NewTask) -> Result<TaskId>;

    /// Write several unconditional date updates. Returns how many were written.
    fn update_task_dates_batch(&mut self, updates: &[(TaskId, DateSpan)]) -> Result<usize> {
        let mut written = 0;
        for (id, span) in updates {
            if self.update_task_dates(*id, *span, None)? == UpdateOutcome::Applied {
                written += 1;
            }
        }
        Ok(written)
    }

    fn insert_tasks(&mut self, tasks: Vec<NewTask>) -> Result<Vec<TaskId>> {
        tasks.into_iter().map(|t| self.insert_task(t)).collect()
    }
}
