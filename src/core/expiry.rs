//! core::expiry
//!
//! Tray expiry ranges.
//!
//! An [`ExpiryRange`] is an immutable value: either a bounded half-open
//! interval `[from, to)` of UTC millisecond timestamps, or the indefinite
//! marker where both bounds are `None`.
//!
//! # Calendar arithmetic
//!
//! Period boundaries are always the UTC instant at midnight on the first
//! day of the period and of the following period. Year rollover is handled
//! by the calendar, never by adjusting offsets, so Q4 and December end on
//! 1 January of the next year.
//!
//! # Example
//!
//! ```
//! use shelfwork::core::expiry::ExpiryRange;
//!
//! let q4 = ExpiryRange::quarter(2024, 4).unwrap();
//! assert_eq!(q4.label, "Q4 2024");
//! assert_eq!(q4, "Q4 2024".parse().unwrap());
//!
//! let jan = ExpiryRange::month(2025, 1).unwrap();
//! assert_eq!(q4.to, jan.from);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Errors from building or parsing an expiry range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpiryParseError {
    #[error("invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("invalid quarter: {0} (expected 1-4)")]
    InvalidQuarter(u32),

    #[error("year out of range: {0}")]
    InvalidYear(i32),

    #[error("unrecognized expiry: {0:?}")]
    Unrecognized(String),
}

/// A tray's expiry window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRange {
    /// Inclusive start, UTC milliseconds.
    pub from: Option<i64>,
    /// Exclusive end, UTC milliseconds.
    pub to: Option<i64>,
    pub label: String,
}

impl ExpiryRange {
    /// The "never expires" marker.
    pub fn indefinite() -> Self {
        Self {
            from: None,
            to: None,
            label: "Never".to_string(),
        }
    }

    /// A whole calendar year.
    pub fn year(year: i32) -> Result<Self, ExpiryParseError> {
        let from = month_start(year, 1)?;
        let to = month_start(year + 1, 1)?;
        Ok(Self {
            from: Some(from),
            to: Some(to),
            label: year.to_string(),
        })
    }

    /// A calendar quarter, `quarter` in 1..=4.
    pub fn quarter(year: i32, quarter: u32) -> Result<Self, ExpiryParseError> {
        if !(1..=4).contains(&quarter) {
            return Err(ExpiryParseError::InvalidQuarter(quarter));
        }
        let first_month = (quarter - 1) * 3 + 1;
        let from = month_start(year, first_month)?;
        let (end_year, end_month) = add_months(year, first_month, 3);
        let to = month_start(end_year, end_month)?;
        Ok(Self {
            from: Some(from),
            to: Some(to),
            label: format!("Q{} {}", quarter, year),
        })
    }

    /// A calendar month, `month` in 1..=12.
    pub fn month(year: i32, month: u32) -> Result<Self, ExpiryParseError> {
        if !(1..=12).contains(&month) {
            return Err(ExpiryParseError::InvalidMonth(month));
        }
        let from = month_start(year, month)?;
        let (end_year, end_month) = add_months(year, month, 1);
        let to = month_start(end_year, end_month)?;
        Ok(Self {
            from: Some(from),
            to: Some(to),
            label: format!("{} {}", MONTH_NAMES[(month - 1) as usize], year),
        })
    }

    /// Both bounds absent.
    pub fn is_indefinite(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether `timestamp` (UTC ms) falls inside `[from, to)`.
    ///
    /// A missing bound is unbounded on that side.
    pub fn contains(&self, timestamp: i64) -> bool {
        let after_start = self.from.map_or(true, |from| timestamp >= from);
        let before_end = self.to.map_or(true, |to| timestamp < to);
        after_start && before_end
    }

    /// Length of the range in whole days, `None` when unbounded.
    pub fn duration_days(&self) -> Option<i64> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some((to - from) / MILLIS_PER_DAY),
            _ => None,
        }
    }
}

impl fmt::Display for ExpiryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for ExpiryRange {
    type Err = ExpiryParseError;

    /// Parse `never`, `2024`, `Q3 2024` or `Mar 2024`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unrecognized = || ExpiryParseError::Unrecognized(s.to_string());

        if trimmed.eq_ignore_ascii_case("never") || trimmed.eq_ignore_ascii_case("indefinite") {
            return Ok(Self::indefinite());
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            [year] => {
                let year: i32 = year.parse().map_err(|_| unrecognized())?;
                Self::year(year)
            }
            [period, year] => {
                let year: i32 = year.parse().map_err(|_| unrecognized())?;
                if let Some(q) = period.strip_prefix(['Q', 'q']) {
                    let quarter: u32 = q.parse().map_err(|_| unrecognized())?;
                    return Self::quarter(year, quarter);
                }
                let month = MONTH_NAMES
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(period))
                    .ok_or_else(unrecognized)?;
                Self::month(year, month as u32 + 1)
            }
            _ => Err(unrecognized()),
        }
    }
}

/// UTC midnight on the first of the month, in milliseconds.
fn month_start(year: i32, month: u32) -> Result<i64, ExpiryParseError> {
    let date =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(ExpiryParseError::InvalidYear(year))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(ExpiryParseError::InvalidYear(year))?;
    Ok(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

/// Add `months` to a 1-based (year, month), carrying into the year.
fn add_months(year: i32, month: u32, months: u32) -> (i32, u32) {
    let zero_based = (month - 1) + months;
    (year + (zero_based / 12) as i32, zero_based % 12 + 1)
}
