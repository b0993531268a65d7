//! Simulation time.
//!
//! The core keeps time the way the rule engine compares it: as decimal days.
//! Calendar queries (day of week, month, day of year) go through [`jiff`],
//! and the routing step crosses crate boundaries as a [`RoutingStep`].

pub mod calendar;
mod step;

use jiff::civil::DateTime;

pub use calendar::CalendarError;
pub use step::{RoutingStep, RoutingStepError};

/// Milliseconds in a day.
pub const MSEC_PER_DAY: f64 = 86_400_000.0;

/// Seconds in a day.
pub const SEC_PER_DAY: f64 = 86_400.0;

/// Tracks the current simulation instant relative to the start date.
///
/// Elapsed time is kept in milliseconds so that repeated step additions do
/// not drift the clock off whole-second boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    start: DateTime,
    start_days: f64,
    elapsed_ms: f64,
}

impl SimClock {
    /// Creates a clock positioned at `start`.
    #[must_use]
    pub fn new(start: DateTime) -> Self {
        Self {
            start,
            start_days: calendar::to_decimal_days(start),
            elapsed_ms: 0.0,
        }
    }

    /// Returns the start date-time.
    #[must_use]
    pub fn start(&self) -> DateTime {
        self.start
    }

    /// Returns the start date-time in decimal days.
    #[must_use]
    pub fn start_days(&self) -> f64 {
        self.start_days
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Returns the elapsed time in decimal days.
    #[must_use]
    pub fn elapsed_days(&self) -> f64 {
        self.elapsed_ms / MSEC_PER_DAY
    }

    /// Returns the current date-time in decimal days.
    #[must_use]
    pub fn now_days(&self) -> f64 {
        self.start_days + self.elapsed_days()
    }

    /// Returns the decimal-day date-time at `elapsed_ms` after the start.
    #[must_use]
    pub fn days_at(&self, elapsed_ms: f64) -> f64 {
        self.start_days + elapsed_ms / MSEC_PER_DAY
    }

    /// Moves the clock to `elapsed_ms` after the start.
    pub fn set_elapsed_ms(&mut self, elapsed_ms: f64) {
        self.elapsed_ms = elapsed_ms;
    }

    /// Returns the current civil date-time.
    ///
    /// # Errors
    ///
    /// Returns a [`CalendarError`] if the instant falls outside the supported range.
    pub fn now(&self) -> Result<DateTime, CalendarError> {
        calendar::from_decimal_days(self.now_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use jiff::civil::date;

    #[test]
    fn clock_advances_in_milliseconds() {
        let mut clock = SimClock::new(date(2024, 3, 1).at(0, 0, 0, 0));
        let start = clock.now_days();

        clock.set_elapsed_ms(6.0 * 3_600_000.0);

        assert_relative_eq!(clock.elapsed_days(), 0.25);
        assert_relative_eq!(clock.now_days() - start, 0.25, epsilon = 1e-9);
        assert_eq!(clock.now().unwrap(), date(2024, 3, 1).at(6, 0, 0, 0));
    }
}
