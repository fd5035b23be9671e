//! Task data model for the schedule graph.
//!
//! A task is one node of a project's dependency graph. It carries a fixed
//! duration, an optional scheduled span, and optionally an absolute
//! constraint that overrides whatever its dependencies compute.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::dates::{format_date, DateSpan};
use crate::core::ids::{CategoryId, ScheduleId, TaskId};

/// Kind of absolute date constraint pinned to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    MustStartOn,
    StartNoEarlier,
    StartNoLater,
    MustFinishOn,
    FinishNoEarlier,
    FinishNoLater,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConstraintKind::MustStartOn => "MUST_START_ON",
            ConstraintKind::StartNoEarlier => "START_NO_EARLIER",
            ConstraintKind::StartNoLater => "START_NO_LATER",
            ConstraintKind::MustFinishOn => "MUST_FINISH_ON",
            ConstraintKind::FinishNoEarlier => "FINISH_NO_EARLIER",
            ConstraintKind::FinishNoLater => "FINISH_NO_LATER",
        };
        f.write_str(s)
    }
}

/// An absolute scheduling rule: a constraint kind and the date it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub date: NaiveDate,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, date: NaiveDate) -> Self {
        Self { kind, date }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, format_date(self.date))
    }
}

/// A single task in a project schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub schedule_id: ScheduleId,
    /// Budget category the task was created for, if any.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    /// Duration in days. Unset durations are treated as one day.
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub constraint: Option<Constraint>,
    /// Ordering hint inherited from the category.
    #[serde(default)]
    pub display_order: Option<i32>,
    /// When the dates were last written.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create an unscheduled task with no duration, category or constraint.
    pub fn new(schedule_id: ScheduleId, name: &str) -> Self {
        Self {
            id: TaskId::new(),
            schedule_id,
            category_id: None,
            name: name.to_string(),
            duration_days: None,
            start_date: None,
            end_date: None,
            constraint: None,
            display_order: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        self
    }

    pub fn with_span(mut self, span: DateSpan) -> Self {
        self.start_date = Some(span.start);
        self.end_date = Some(span.end);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category_id = Some(category);
        self
    }

    /// Duration used for date arithmetic: the stored value, or one day.
    pub fn effective_duration(&self) -> u32 {
        self.duration_days.filter(|d| *d > 0).unwrap_or(1)
    }

    /// The scheduled span, if both dates are set.
    pub fn span(&self) -> Option<DateSpan> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateSpan::new(start, end)),
            _ => None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.start_date.is_some()
    }

    /// Write a new span and stamp the update time.
    pub fn set_span(&mut self, span: DateSpan) {
        self.start_date = Some(span.start);
        self.end_date = Some(span.end);
        self.updated_at = Utc::now();
    }

    /// Whether the stored span disagrees with `start + duration - 1`.
    pub fn span_is_inconsistent(&self) -> bool {
        match self.span() {
            Some(span) => span.len_days() != i64::from(self.effective_duration()),
            None => false,
        }
    }
}
