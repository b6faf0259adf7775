//! Calendar-month arithmetic.
//!
//! Months are stepped by their index (`year * 12 + month - 1`), never by
//! adding a fixed number of days, so windows line up with real month
//! boundaries across 28/29/30/31-day months and year ends.

use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::error::{ComputeError, Result};

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ComputeError::Validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        // Make sure both ends of the month are representable
        let key = Self { year, month };
        key.first_day()?;
        key.last_day()?;
        Ok(key)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_index(index: i64) -> Result<Self> {
        let year = i32::try_from(index.div_euclid(12))
            .map_err(|_| ComputeError::Date(format!("Month index {} out of range", index)))?;
        let month = index.rem_euclid(12) as u32 + 1;
        Self::new(year, month)
    }

    /// Moves by `delta` calendar months (negative goes back).
    pub fn add_months(&self, delta: i64) -> Result<Self> {
        Self::from_index(self.index() + delta)
    }

    pub fn next(&self) -> Result<Self> {
        self.add_months(1)
    }

    pub fn previous(&self) -> Result<Self> {
        self.add_months(-1)
    }

    pub fn first_day(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            ComputeError::Date(format!("Invalid month {}-{:02}", self.year, self.month))
        })
    }

    pub fn last_day(&self) -> Result<NaiveDate> {
        let days = days_in_month(self.year, self.month)?;
        NaiveDate::from_ymd_opt(self.year, self.month, days).ok_or_else(|| {
            ComputeError::Date(format!("Invalid month {}-{:02}", self.year, self.month))
        })
    }

    /// `(first_day, last_day)` of the month.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        Ok((self.first_day()?, self.last_day()?))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Returns the number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    // First day of the next month, one day back
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .ok_or_else(|| ComputeError::Date(format!("Invalid month {}-{:02}", year, month)))
}

/// The `months` calendar months ending with (and including) `last`, oldest first.
pub fn month_window(last: MonthKey, months: u32) -> Result<Vec<MonthKey>> {
    if months == 0 {
        return Ok(Vec::new());
    }
    let first = last.add_months(-(months as i64 - 1))?;
    (0..months as i64).map(|offset| first.add_months(offset)).collect()
}
