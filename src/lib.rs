//! Dependency-driven date scheduling for construction projects.
//!
//! Tasks are nodes of a per-project dependency graph. Moving one task
//! cascades new dates to everything downstream of it; a project's
//! unscheduled work can be laid out in one pass from its budget categories.

pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod schedule;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use schedule::{
    move_task, run_auto_schedule, run_cascade, run_cascade_from_stored_start, AutoScheduleReport,
    CascadeReport,
};
pub use store::{JsonStore, MemoryStore, ScheduleStore};
