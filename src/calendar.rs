use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::InvalidDateError;

/// A Gregorian calendar date.
///
/// Fields are unchecked: any integers are accepted and [`to_ethiopian`] will
/// still produce a value for them. Use [`GregorianDate::checked`] or
/// [`try_to_ethiopian`] when the input must be a real date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GregorianDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// A date in the Ethiopian calendar: 13 months, the last (Pagume) being 5 or
/// 6 days long.
///
/// Values returned by [`to_ethiopian`] are not normalized, so `day` may exceed
/// the length of `month`. See [`EthiopianDate::is_calendar_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthiopianDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// Ethiopian month number of Pagume.
pub const PAGUME: i32 = 13;

impl GregorianDate {
    pub const fn new(year: i32, month: i32, day: i32) -> Self {
        Self { year, month, day }
    }

    /// Build a date, rejecting anything that is not a real Gregorian date.
    pub fn checked(year: i32, month: i32, day: i32) -> Result<Self, InvalidDateError> {
        let date = Self::new(year, month, day);
        date.validate()?;
        Ok(date)
    }

    pub fn validate(&self) -> Result<(), InvalidDateError> {
        if self.year < 1 {
            return Err(InvalidDateError::Year(self.year));
        }
        let max = gregorian_days_in_month(self.year, self.month)
            .ok_or(InvalidDateError::Month(self.month))?;
        if !(1..=max).contains(&self.day) {
            return Err(InvalidDateError::Day {
                year: self.year,
                month: self.month,
                day: self.day,
                max,
            });
        }
        Ok(())
    }
}

impl From<NaiveDate> for GregorianDate {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month() as i32, date.day() as i32)
    }
}

/// Uses the calendar date in the timestamp's own offset.
impl<Tz: TimeZone> From<DateTime<Tz>> for GregorianDate {
    fn from(timestamp: DateTime<Tz>) -> Self {
        timestamp.date_naive().into()
    }
}

impl fmt::Display for GregorianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl EthiopianDate {
    pub const fn new(year: i32, month: i32, day: i32) -> Self {
        Self { year, month, day }
    }

    /// Number of days in this date's month, or `None` if the month is not 1-13.
    pub fn days_in_month(&self) -> Option<i32> {
        match self.month {
            1..=12 => Some(30),
            PAGUME if is_ethiopian_leap_year(self.year) => Some(6),
            PAGUME => Some(5),
            _ => None,
        }
    }

    /// Whether the fields name an actual day of the Ethiopian calendar.
    pub fn is_calendar_valid(&self) -> bool {
        self.days_in_month()
            .map_or(false, |max| (1..=max).contains(&self.day))
    }
}

impl fmt::Display for EthiopianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

pub fn is_gregorian_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Pagume gets its sixth day in the year before a Gregorian leap year.
pub fn is_ethiopian_leap_year(year: i32) -> bool {
    year.rem_euclid(4) == 3
}

pub fn gregorian_days_in_month(year: i32, month: i32) -> Option<i32> {
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_gregorian_leap_year(year) => 29,
        2 => 28,
        _ => return None,
    };
    Some(days)
}

/// Convert a Gregorian date to the Ethiopian calendar.
///
/// Dates from January 1-9 belong to the Ethiopian year that began the
/// previous September. September onwards starts the new Ethiopian year, with
/// each Gregorian month split at the day it crosses an Ethiopian month
/// boundary. Every other date goes through a linear `month + 4`, `day + 21`
/// mapping which is only exact near the start of the year.
///
/// No validation and no carry: out-of-range input gives out-of-range output.
pub fn to_ethiopian(date: GregorianDate) -> EthiopianDate {
    let GregorianDate { year, month, day } = date;

    // Wrapping so that extreme unchecked input cannot panic in debug builds.
    match (month, day) {
        (1, d) if d <= 9 => EthiopianDate::new(year.wrapping_sub(8), 4, d.wrapping_add(21)),
        (m, d) if m >= 9 => {
            let (month, day) = match (m, d) {
                (9, d) => (1, d.wrapping_sub(10)),
                (10, d) if d <= 10 => (1, d.wrapping_add(20)),
                (10, d) => (2, d.wrapping_sub(10)),
                (11, d) if d <= 9 => (2, d.wrapping_add(21)),
                (11, d) => (3, d.wrapping_sub(9)),
                (12, d) if d <= 9 => (3, d.wrapping_add(21)),
                (12, d) => (4, d.wrapping_sub(9)),
                (m, d) => (m.wrapping_sub(8), d.wrapping_add(21)),
            };
            EthiopianDate::new(year.wrapping_sub(7), month, day)
        }
        (m, d) => EthiopianDate::new(year.wrapping_sub(7), m.wrapping_add(4), d.wrapping_add(21)),
    }
}

/// Like [`to_ethiopian`], but rejects input that is not a real Gregorian date.
pub fn try_to_ethiopian(date: GregorianDate) -> Result<EthiopianDate, InvalidDateError> {
    date.validate()?;
    Ok(to_ethiopian(date))
}
