//! Calendar arithmetic on whole days.
//!
//! All spans are inclusive on both ends: a one-day task starts and ends on
//! the same date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Add a signed number of days to a date.
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or(Error::DateOutOfRange { date, days })
}

/// Number of days in the inclusive range `[start, end]`.
///
/// Returns zero or a negative count when `end` precedes `start`.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::Validation(format!("invalid date '{}': {}", s, e)))
}

/// An inclusive start/end pair of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Span of `duration` days beginning on `start`.
    pub fn starting(start: NaiveDate, duration: u32) -> Result<Self> {
        let end = add_days(start, i64::from(duration.max(1)) - 1)?;
        Ok(Self { start, end })
    }

    /// Span of `duration` days finishing on `end`.
    pub fn ending(end: NaiveDate, duration: u32) -> Result<Self> {
        let start = add_days(end, 1 - i64::from(duration.max(1)))?;
        Ok(Self { start, end })
    }

    pub fn len_days(&self) -> i64 {
        span_days(self.start, self.end)
    }
}

impl std::fmt::Display for DateSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", format_date(self.start), format_date(self.end))
    }
}
