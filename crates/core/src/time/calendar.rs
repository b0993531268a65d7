//! Conversions between civil date-times and decimal days.
//!
//! Day zero is 1899-12-30, so whole days count dates and the fractional part
//! is the time of day.

use jiff::{
    SignedDuration,
    civil::{Date, DateTime, date},
};
use thiserror::Error;

use super::SEC_PER_DAY;

const EPOCH: DateTime = date(1899, 12, 30).at(0, 0, 0, 0);

/// Error returned when a value cannot be mapped onto the civil calendar.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("decimal day {0} is outside the supported calendar range")]
    OutOfRange(f64),

    #[error(transparent)]
    Jiff(#[from] jiff::Error),
}

/// Converts a civil date-time to decimal days.
#[must_use]
pub fn to_decimal_days(datetime: DateTime) -> f64 {
    datetime.duration_since(EPOCH).as_secs_f64() / SEC_PER_DAY
}

/// Converts decimal days to a civil date-time.
///
/// # Errors
///
/// Returns an error if `days` is not finite or lands outside jiff's range.
pub fn from_decimal_days(days: f64) -> Result<DateTime, CalendarError> {
    if !days.is_finite() {
        return Err(CalendarError::OutOfRange(days));
    }
    let offset = SignedDuration::try_from_secs_f64((days * SEC_PER_DAY).round())
        .map_err(|_| CalendarError::OutOfRange(days))?;
    Ok(EPOCH.checked_add(offset)?)
}

/// Converts a civil date to whole decimal days.
#[must_use]
pub fn date_to_days(day: Date) -> f64 {
    to_decimal_days(day.to_datetime(jiff::civil::Time::midnight()))
}

/// Returns the day of week for a decimal-day date, with Sunday = 1.
///
/// # Errors
///
/// Returns an error if `days` does not map to a calendar date.
pub fn day_of_week(days: f64) -> Result<i8, CalendarError> {
    Ok(from_decimal_days(days.floor())?
        .weekday()
        .to_sunday_one_offset())
}

/// Returns the month of year (1–12) for a decimal-day date.
///
/// # Errors
///
/// Returns an error if `days` does not map to a calendar date.
pub fn month_of_year(days: f64) -> Result<i8, CalendarError> {
    Ok(from_decimal_days(days.floor())?.month())
}

/// Returns the day of year (1–366) for a decimal-day date.
///
/// # Errors
///
/// Returns an error if `days` does not map to a calendar date.
pub fn day_of_year(days: f64) -> Result<i16, CalendarError> {
    Ok(from_decimal_days(days.floor())?.date().day_of_year())
}

/// Returns the hour of day (0–23) for a decimal-day date-time.
///
/// # Errors
///
/// Returns an error if `days` does not map to a calendar date.
pub fn hour_of_day(days: f64) -> Result<i8, CalendarError> {
    Ok(from_decimal_days(days)?.hour())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn epoch_is_day_zero() {
        assert_relative_eq!(to_decimal_days(EPOCH), 0.0);
        assert_relative_eq!(
            to_decimal_days(date(1900, 1, 1).at(12, 0, 0, 0)),
            2.5
        );
    }

    #[test]
    fn round_trips_to_the_second() {
        let when = date(2021, 7, 14).at(17, 45, 30, 0);
        let days = to_decimal_days(when);
        assert_eq!(from_decimal_days(days).unwrap(), when);
    }

    #[test]
    fn calendar_fields() {
        // 2024-01-07 was a Sunday.
        let sunday = date_to_days(date(2024, 1, 7));
        assert_eq!(day_of_week(sunday + 0.9).unwrap(), 1);
        assert_eq!(day_of_week(sunday + 6.0).unwrap(), 7);
        assert_eq!(month_of_year(sunday + 31.0).unwrap(), 2);
        assert_eq!(day_of_year(sunday + 0.5).unwrap(), 7);
        assert_eq!(hour_of_day(sunday + 0.75).unwrap(), 18);
    }

    #[test]
    fn rejects_non_finite_days() {
        assert!(from_decimal_days(f64::NAN).is_err());
    }
}
