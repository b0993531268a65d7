use std::{fmt, ops::Deref};

use thiserror::Error;
use uom::{
    Conversion,
    si::{f64::Time, time},
};

use super::SEC_PER_DAY;

/// A unit-safe, strictly positive routing time step.
///
/// Step-size policies return plain seconds because that is what hydraulic
/// solvers work in. Converting the result into a `RoutingStep` is where a
/// zero, negative, or non-finite step is caught, before it can stall the
/// simulation clock.
///
/// ```
/// use sluice_core::RoutingStep;
/// use uom::si::time::minute;
///
/// let step = RoutingStep::new::<minute>(0.5).unwrap();
/// assert_eq!(step.seconds(), 30.0);
///
/// assert!(RoutingStep::from_seconds(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RoutingStep(Time);

/// Error returned when constructing an invalid [`RoutingStep`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RoutingStepError {
    #[error("routing step must be positive and finite, got {0} s")]
    NotPositive(f64),
}

impl RoutingStep {
    /// Constructs a step from a value in any [`uom`] time unit.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingStepError::NotPositive`] if the value is not strictly positive.
    pub fn new<U>(value: f64) -> Result<Self, RoutingStepError>
    where
        U: time::Unit + Conversion<f64, T = f64>,
    {
        Self::from_time(Time::new::<U>(value))
    }

    /// Constructs a step from a number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingStepError::NotPositive`] if `seconds` is not strictly positive.
    pub fn from_seconds(seconds: f64) -> Result<Self, RoutingStepError> {
        Self::new::<time::second>(seconds)
    }

    /// Constructs a step from an existing [`Time`].
    ///
    /// # Errors
    ///
    /// Returns [`RoutingStepError::NotPositive`] if the time is not strictly positive.
    pub fn from_time(time: Time) -> Result<Self, RoutingStepError> {
        let seconds = time.get::<time::second>();
        if seconds.is_finite() && seconds > 0.0 {
            Ok(Self(time))
        } else {
            Err(RoutingStepError::NotPositive(seconds))
        }
    }

    /// Returns the step length in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.0.get::<time::second>()
    }

    /// Returns the step length in milliseconds.
    #[must_use]
    pub fn millis(&self) -> f64 {
        self.seconds() * 1000.0
    }

    /// Returns the step length in decimal days.
    #[must_use]
    pub fn days(&self) -> f64 {
        self.seconds() / SEC_PER_DAY
    }
}

impl TryFrom<Time> for RoutingStep {
    type Error = RoutingStepError;

    fn try_from(time: Time) -> Result<Self, Self::Error> {
        Self::from_time(time)
    }
}

impl Deref for RoutingStep {
    type Target = Time;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for RoutingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::time::{hour, second};

    #[test]
    fn converts_between_units() {
        let step = RoutingStep::new::<hour>(6.0).unwrap();
        assert_relative_eq!(step.seconds(), 21_600.0);
        assert_relative_eq!(step.millis(), 21_600_000.0);
        assert_relative_eq!(step.days(), 0.25);
        assert_relative_eq!(step.get::<second>(), 21_600.0);
    }

    #[test]
    fn rejects_non_positive_steps() {
        assert_eq!(
            RoutingStep::from_seconds(-1.0),
            Err(RoutingStepError::NotPositive(-1.0))
        );
        assert!(RoutingStep::from_seconds(0.0).is_err());
        assert!(RoutingStep::from_seconds(f64::NAN).is_err());
        assert!(RoutingStep::from_seconds(f64::INFINITY).is_err());
    }
}
