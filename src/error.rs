use thiserror::Error;

/// Raised by the strict conversion APIs when a Gregorian date is not a real
/// calendar date. The default APIs never produce it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDateError {
    #[error("year {0} is outside the Gregorian era (must be >= 1)")]
    Year(i32),

    #[error("month {0} is out of range (must be 1-12)")]
    Month(i32),

    #[error("day {day} is out of range for {year}-{month:02} (must be 1-{max})")]
    Day {
        year: i32,
        month: i32,
        day: i32,
        max: i32,
    },
}
