//! Date type and Julian-day ordinates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::error::{CoreError, CoreResult};

/// Days per year used by the ACT/365 Fixed year fraction.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Offset between `NaiveDate::num_days_from_ce` and the Julian day number.
const JULIAN_DAY_OFFSET: i64 = 1_721_425;

/// A calendar date for curve construction.
///
/// Spline knots are positioned on the Julian day number of a date, so every
/// `Date` maps one-to-one onto an integral ordinate.
///
/// # Example
///
/// ```rust
/// use spanline_core::types::Date;
///
/// let date = Date::from_ymd(2000, 1, 1).unwrap();
/// assert_eq!(date.julian_day(), 2_451_545);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a new date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date is invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Creates a date from an ISO 8601 string (YYYY-MM-DD).
    pub fn parse(s: &str) -> CoreResult<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|_| CoreError::invalid_date(format!("Cannot parse: {s}")))
    }

    /// Creates a date from its Julian day number.
    pub fn from_julian_day(julian_day: i64) -> CoreResult<Self> {
        let days_from_ce = i32::try_from(julian_day - JULIAN_DAY_OFFSET)
            .map_err(|_| CoreError::invalid_ordinate(julian_day as f64))?;
        NaiveDate::from_num_days_from_ce_opt(days_from_ce)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_ordinate(julian_day as f64))
    }

    /// Creates a date from a spline ordinate.
    ///
    /// The ordinate must be a finite, integral Julian day number.
    pub fn from_ordinate(ordinate: f64) -> CoreResult<Self> {
        if !ordinate.is_finite() || ordinate.fract() != 0.0 {
            return Err(CoreError::invalid_ordinate(ordinate));
        }
        Self::from_julian_day(ordinate as i64)
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the Julian day number.
    #[must_use]
    pub fn julian_day(&self) -> i64 {
        i64::from(self.0.num_days_from_ce()) + JULIAN_DAY_OFFSET
    }

    /// Returns the Julian day number as a spline ordinate.
    #[must_use]
    pub fn ordinate(&self) -> f64 {
        self.julian_day() as f64
    }

    /// Adds a number of days to the date.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Adds a number of months to the date.
    ///
    /// The day is clamped to the last valid day of the target month.
    pub fn add_months(&self, months: i32) -> CoreResult<Self> {
        let total_months = self.year() * 12 + self.month() as i32 - 1 + months;
        let new_year = total_months.div_euclid(12);
        let new_month = (total_months.rem_euclid(12) + 1) as u32;
        let new_day = self.day().min(days_in_month(new_year, new_month));

        Self::from_ymd(new_year, new_month, new_day)
    }

    /// Adds a number of years to the date.
    pub fn add_years(&self, years: i32) -> CoreResult<Self> {
        self.add_months(years * 12)
    }

    /// Calculates the number of calendar days between two dates.
    #[must_use]
    pub fn days_between(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// ACT/365 Fixed year fraction from `self` to `other`.
    #[must_use]
    pub fn year_fraction(&self, other: &Date) -> f64 {
        self.days_between(other) as f64 / DAYS_PER_YEAR
    }

    /// Returns the underlying `NaiveDate`.
    #[must_use]
    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl Add<i64> for Date {
    type Output = Date;

    fn add(self, days: i64) -> Self::Output {
        self.add_days(days)
    }
}

impl Sub<Date> for Date {
    type Output = i64;

    fn sub(self, other: Date) -> Self::Output {
        other.days_between(&self)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        _ => 28,
    }
}
