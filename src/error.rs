use chrono::NaiveDate;
use thiserror::Error;

use crate::core::{CategoryId, ProjectId, ScheduleId, TaskId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid id: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(ScheduleId),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Project {0} has no start date")]
    MissingStartDate(ProjectId),

    #[error("Date out of range: {date} {days:+} days")]
    DateOutOfRange { date: NaiveDate, days: i64 },

    #[error("Check found {0} problem(s)")]
    CheckFailed(usize),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cascade from task {task} in schedule {schedule} aborted: {reason}")]
    CascadeAborted {
        task: TaskId,
        schedule: ScheduleId,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
