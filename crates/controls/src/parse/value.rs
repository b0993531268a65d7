//! Literal values in rule clauses.

use jiff::civil::Date;
use sluice_core::time::calendar;

use crate::{Attribute, Object, RuleError};

/// Reference year for month/day values, chosen for having no leap day.
const DAY_OF_YEAR_BASE: i16 = 1947;

pub(super) fn number(word: &str) -> Result<f64, RuleError> {
    word.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RuleError::InvalidNumber(word.to_owned()))
}

/// Parses `hh:mm`, `hh:mm:ss`, or decimal hours into decimal days.
pub(super) fn time(word: &str) -> Result<f64, RuleError> {
    let invalid = || RuleError::InvalidDateTime(word.to_owned());

    if !word.contains(':') {
        let hours = word.parse::<f64>().map_err(|_| invalid())?;
        if !hours.is_finite() || hours < 0.0 {
            return Err(invalid());
        }
        return Ok(hours / 24.0);
    }

    let mut parts = word.split(':').map(str::parse::<u32>);
    let hours = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
    let minutes = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
    let seconds = match parts.next() {
        Some(part) => part.map_err(|_| invalid())?,
        None => 0,
    };
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }
    Ok(f64::from(hours * 3600 + minutes * 60 + seconds) / 86_400.0)
}

/// Parses `mm/dd/yyyy` or `yyyy-mm-dd` into whole decimal days.
pub(super) fn date(word: &str) -> Result<f64, RuleError> {
    Date::strptime("%m/%d/%Y", word)
        .or_else(|_| word.parse::<Date>())
        .map(calendar::date_to_days)
        .map_err(|_| RuleError::InvalidDateTime(word.to_owned()))
}

/// Parses a day of year given as `mm/dd` or as a number from 1 to 365.
fn day_of_year(word: &str) -> Result<f64, RuleError> {
    let invalid = || RuleError::InvalidDateTime(word.to_owned());

    if let Some((month, day)) = word.split_once('/') {
        let month = month.parse::<i8>().map_err(|_| invalid())?;
        let day = day.parse::<i8>().map_err(|_| invalid())?;
        let date = Date::new(DAY_OF_YEAR_BASE, month, day).map_err(|_| invalid())?;
        return Ok(f64::from(date.day_of_year()));
    }

    let value = number(word)?;
    if (1.0..=365.0).contains(&value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}

fn in_range(word: &str, low: f64, high: f64) -> Result<f64, RuleError> {
    let value = number(word)?;
    if (low..=high).contains(&value) {
        Ok(value)
    } else {
        Err(RuleError::InvalidDateTime(word.to_owned()))
    }
}

/// Parses the value a premise compares `attribute` against.
pub(super) fn premise_value(word: &str, attribute: Attribute) -> Result<f64, RuleError> {
    match attribute {
        Attribute::Status => status(word, Object::Pump).or_else(|_| status(word, Object::Conduit)),
        Attribute::Time | Attribute::ClockTime | Attribute::TimeOpen | Attribute::TimeClosed => {
            time(word)
        }
        Attribute::Date => date(word),
        Attribute::Day => in_range(word, 1.0, 7.0),
        Attribute::Month => in_range(word, 1.0, 12.0),
        Attribute::DayOfYear => day_of_year(word),
        _ => number(word),
    }
}

/// Parses `ON`/`OFF` for pumps and `OPEN`/`CLOSED` for everything else.
pub(super) fn status(word: &str, object: Object) -> Result<f64, RuleError> {
    let (off, on) = if object == Object::Pump {
        ("OFF", "ON")
    } else {
        ("CLOSED", "OPEN")
    };
    if word.eq_ignore_ascii_case(off) {
        Ok(0.0)
    } else if word.eq_ignore_ascii_case(on) {
        Ok(1.0)
    } else {
        Err(RuleError::UnknownKeyword(word.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn times() {
        assert_relative_eq!(time("06:00").unwrap(), 0.25);
        assert_relative_eq!(time("12:30:00").unwrap(), 12.5 / 24.0);
        assert_relative_eq!(time("36").unwrap(), 1.5);
        assert_relative_eq!(time("1.5").unwrap(), 1.5 / 24.0);
        assert!(time("10:75").is_err());
        assert!(time("10:00:00:00").is_err());
        assert!(time("noon").is_err());
    }

    #[test]
    fn dates() {
        let expected = calendar::date_to_days(jiff::civil::date(2024, 7, 4));
        assert_relative_eq!(date("07/04/2024").unwrap(), expected);
        assert_relative_eq!(date("2024-07-04").unwrap(), expected);
        assert!(date("13/40/2024").is_err());
    }

    #[test]
    fn calendar_fields_are_range_checked() {
        assert_relative_eq!(premise_value("7", Attribute::Day).unwrap(), 7.0);
        assert!(premise_value("8", Attribute::Day).is_err());
        assert!(premise_value("0", Attribute::Month).is_err());
        assert_relative_eq!(premise_value("03/01", Attribute::DayOfYear).unwrap(), 60.0);
        assert_relative_eq!(premise_value("200", Attribute::DayOfYear).unwrap(), 200.0);
        assert!(premise_value("366", Attribute::DayOfYear).is_err());
    }

    #[test]
    fn status_words() {
        assert_relative_eq!(status("on", Object::Pump).unwrap(), 1.0);
        assert_relative_eq!(status("CLOSED", Object::Conduit).unwrap(), 0.0);
        assert!(status("OPEN", Object::Pump).is_err());
        assert_relative_eq!(premise_value("OPEN", Attribute::Status).unwrap(), 1.0);
        assert_relative_eq!(premise_value("off", Attribute::Status).unwrap(), 0.0);
    }

    #[test]
    fn numbers_must_be_finite() {
        assert_relative_eq!(number("-2.5e1").unwrap(), -25.0);
        assert!(number("inf").is_err());
        assert!(number("five").is_err());
    }
}
