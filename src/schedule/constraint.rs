//! Absolute date constraints applied after dependency calculation.
//!
//! A constraint always wins over whatever the task's dependencies computed.
//! Each task is corrected on its own; conflicting constraints elsewhere in
//! the graph are not negotiated.

use crate::core::dates::DateSpan;
use crate::core::{Constraint, ConstraintKind};
use crate::error::Result;

/// Correct a provisional span with a task's constraint, if it has one.
pub fn apply_constraint(
    constraint: Option<&Constraint>,
    provisional: DateSpan,
    duration: u32,
) -> Result<DateSpan> {
    let Some(constraint) = constraint else {
        return Ok(provisional);
    };
    let date = constraint.date;

    match constraint.kind {
        ConstraintKind::MustStartOn => DateSpan::starting(date, duration),
        ConstraintKind::StartNoEarlier if provisional.start < date => {
            DateSpan::starting(date, duration)
        }
        ConstraintKind::StartNoLater if provisional.start > date => {
            DateSpan::starting(date, duration)
        }
        ConstraintKind::MustFinishOn => DateSpan::ending(date, duration),
        ConstraintKind::FinishNoEarlier if provisional.end < date => {
            DateSpan::ending(date, duration)
        }
        ConstraintKind::FinishNoLater if provisional.end > date => {
            DateSpan::ending(date, duration)
        }
        _ => Ok(provisional),
    }
}
