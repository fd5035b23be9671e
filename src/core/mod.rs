//! Core domain models for construction schedules.
//!
//! Tasks, dependencies and the calendar types shared by the scheduling
//! components and the persistence port.

pub mod dag;
pub mod dates;
pub mod ids;
pub mod project;
pub mod task;

pub use dag::{Dependency, DependencyType, ScheduleGraph};
pub use dates::DateSpan;
pub use ids::{CategoryId, ProjectId, ScheduleId, TaskId};
pub use project::{BudgetCategory, CategoryDefault, Project, Schedule};
pub use task::{Constraint, ConstraintKind, Task};
