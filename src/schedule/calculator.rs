//! Successor dates from a predecessor span and a dependency relation.

use crate::core::dates::{add_days, DateSpan};
use crate::core::DependencyType;
use crate::error::Result;

/// Compute a successor's provisional span.
///
/// - `finish_to_start`: starts the day after `pred.end + lag`
/// - `start_to_start`: starts on `pred.start + lag`
/// - `finish_to_finish`: ends on `pred.end + lag`
/// - `start_to_finish`: ends on `pred.start + lag`
///
/// Returns `Ok(None)` for an unrecognized dependency type. A zero duration is
/// treated as one day.
pub fn successor_span(
    predecessor: DateSpan,
    dependency: DependencyType,
    lag_days: i64,
    duration: u32,
) -> Result<Option<DateSpan>> {
    let span = match dependency {
        DependencyType::FinishToStart => {
            let start = add_days(predecessor.end, lag_days.saturating_add(1))?;
            DateSpan::starting(start, duration)?
        }
        DependencyType::StartToStart => {
            let start = add_days(predecessor.start, lag_days)?;
            DateSpan::starting(start, duration)?
        }
        DependencyType::FinishToFinish => {
            let end = add_days(predecessor.end, lag_days)?;
            DateSpan::ending(end, duration)?
        }
        DependencyType::StartToFinish => {
            let end = add_days(predecessor.start, lag_days)?;
            DateSpan::ending(end, duration)?
        }
        DependencyType::Unrecognized => return Ok(None),
    };
    Ok(Some(span))
}
