use sluice_core::time::{CalendarError, calendar};

/// Calendar position used to pick pattern factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTime {
    /// Month of year, 0 = January.
    pub month: usize,
    /// Day of week, 0 = Sunday.
    pub day: usize,
    /// Hour of day, 0–23.
    pub hour: usize,
}

impl PatternTime {
    /// Locates a decimal-day date-time on the calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if `days` does not map to a calendar date.
    pub fn at(days: f64) -> Result<Self, CalendarError> {
        let zero_based = |value: i8| usize::try_from(value - 1).unwrap_or(0);
        Ok(Self {
            month: zero_based(calendar::month_of_year(days)?),
            day: zero_based(calendar::day_of_week(days)?),
            hour: usize::try_from(calendar::hour_of_day(days)?).unwrap_or(0),
        })
    }

    #[must_use]
    pub fn is_weekend(&self) -> bool {
        self.day == 0 || self.day == 6
    }
}

/// Multipliers applied to a baseline inflow over the calendar.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Monthly([f64; 12]),
    /// Indexed by day of week, starting on Sunday.
    Daily([f64; 7]),
    Hourly([f64; 24]),
    /// Hourly factors that only apply on Saturday and Sunday.
    Weekend([f64; 24]),
}

impl Pattern {
    /// Returns the factor at `when`, or 1 where the pattern does not apply.
    #[must_use]
    pub fn factor(&self, when: PatternTime) -> f64 {
        let factor = match self {
            Self::Monthly(factors) => factors.get(when.month),
            Self::Daily(factors) => factors.get(when.day),
            Self::Hourly(factors) => factors.get(when.hour),
            Self::Weekend(factors) if when.is_weekend() => factors.get(when.hour),
            Self::Weekend(_) => None,
        };
        factor.copied().unwrap_or(1.0)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Monthly(_) => "monthly",
            Self::Daily(_) => "daily",
            Self::Hourly(_) => "hourly",
            Self::Weekend(_) => "weekend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use jiff::civil::date;

    #[test]
    fn locates_calendar_fields() {
        // A Saturday afternoon in March.
        let days = calendar::to_decimal_days(date(2024, 3, 16).at(14, 30, 0, 0));
        let when = PatternTime::at(days).unwrap();
        assert_eq!(
            when,
            PatternTime {
                month: 2,
                day: 6,
                hour: 14
            }
        );
        assert!(when.is_weekend());
    }

    #[test]
    fn weekend_factors_only_apply_on_weekends() {
        let mut factors = [1.0; 24];
        factors[8] = 0.5;
        let pattern = Pattern::Weekend(factors);

        let saturday = PatternTime {
            month: 0,
            day: 6,
            hour: 8,
        };
        let monday = PatternTime { day: 1, ..saturday };
        assert_relative_eq!(pattern.factor(saturday), 0.5);
        assert_relative_eq!(pattern.factor(monday), 1.0);
    }
}
