//! Projects, schedules and budget categories.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::ids::{CategoryId, ProjectId, ScheduleId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Anchor date for auto-scheduling.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub schedule_id: ScheduleId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub project_id: ProjectId,
}

/// A line of a project's budget. Categories with money left but no task
/// get a task created for them by the auto-scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub id: CategoryId,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub remaining_budget: f64,
}

/// Operator-configured defaults for a category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefault {
    pub name: String,
    pub duration_days: u32,
    pub display_order: i32,
}

impl CategoryDefault {
    pub fn new(name: &str, duration_days: u32, display_order: i32) -> Self {
        Self {
            name: name.to_string(),
            duration_days,
            display_order,
        }
    }
}
