//! Lateral inflow sources defined on nodes.
//!
//! External and dry-weather inflows are computed here from patterns and
//! time series. Flows that depend on the runoff model (wet weather,
//! groundwater, LID drains) come from the [`Runoff`](crate::Runoff)
//! collaborator instead.

mod pattern;

use sluice_core::{Network, TableError, Tables};
use thiserror::Error;

use crate::InflowCategory;

pub use pattern::{Pattern, PatternTime};

/// Errors raised by inflow definitions that do not fit the model.
#[derive(Debug, Error)]
pub enum InflowError {
    #[error("inflow refers to missing node index {0}")]
    UnknownNode(usize),

    #[error("inflow refers to missing pattern index {0}")]
    UnknownPattern(usize),

    #[error("inflow refers to missing time series index {0}")]
    UnknownSeries(usize),

    #[error("pattern {index} is {found}, but the {slot} slot needs a {slot} pattern")]
    WrongPatternKind {
        index: usize,
        slot: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// A user-specified inflow: a patterned baseline plus a scaled time series.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalInflow {
    pub node: usize,
    pub baseline: f64,
    pub baseline_pattern: Option<usize>,
    pub series: Option<usize>,
    /// Multiplier on the time series value.
    pub scale: f64,
    /// Converts the inflow's units to cfs.
    pub conversion: f64,
}

impl ExternalInflow {
    /// A constant inflow of `baseline` cfs.
    #[must_use]
    pub fn constant(node: usize, baseline: f64) -> Self {
        Self {
            node,
            baseline,
            baseline_pattern: None,
            series: None,
            scale: 1.0,
            conversion: 1.0,
        }
    }

    /// An inflow that follows a time series, in cfs.
    #[must_use]
    pub fn series(node: usize, series: usize) -> Self {
        Self {
            series: Some(series),
            ..Self::constant(node, 0.0)
        }
    }

    fn flow_at(
        &self,
        days: f64,
        when: PatternTime,
        patterns: &[Pattern],
        tables: &Tables,
    ) -> Result<f64, InflowError> {
        let mut baseline = self.baseline;
        if let Some(index) = self.baseline_pattern {
            baseline *= pattern(patterns, index)?.factor(when);
        }
        let series = match self.series {
            Some(index) => series(tables, index)?.value_at(days)? * self.scale,
            None => 0.0,
        };
        Ok(self.conversion * (series + baseline))
    }
}

/// An average sanitary inflow shaped by monthly, daily, and hourly patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct DryWeatherInflow {
    pub node: usize,
    /// Average flow in cfs.
    pub average: f64,
    pub monthly: Option<usize>,
    pub daily: Option<usize>,
    pub hourly: Option<usize>,
    /// Replaces the hourly pattern on weekends.
    pub weekend: Option<usize>,
}

impl DryWeatherInflow {
    #[must_use]
    pub fn new(node: usize, average: f64) -> Self {
        Self {
            node,
            average,
            monthly: None,
            daily: None,
            hourly: None,
            weekend: None,
        }
    }

    fn flow_at(&self, when: PatternTime, patterns: &[Pattern]) -> Result<f64, InflowError> {
        let hourly = match self.weekend {
            Some(weekend) if when.is_weekend() => Some(weekend),
            _ => self.hourly,
        };
        let mut factor = 1.0;
        for index in [self.monthly, self.daily, hourly].into_iter().flatten() {
            factor *= pattern(patterns, index)?.factor(when);
        }
        Ok(factor * self.average)
    }

    fn slots(&self) -> [(&'static str, Option<usize>); 4] {
        [
            ("monthly", self.monthly),
            ("daily", self.daily),
            ("hourly", self.hourly),
            ("weekend", self.weekend),
        ]
    }
}

/// A precomputed inflow read from a time series, such as RDII or a routing
/// interface file.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesInflow {
    pub node: usize,
    pub series: usize,
    pub category: InflowCategory,
}

/// Every pattern-driven and series-driven inflow in a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inflows {
    pub patterns: Vec<Pattern>,
    pub external: Vec<ExternalInflow>,
    pub dry_weather: Vec<DryWeatherInflow>,
    pub series: Vec<SeriesInflow>,
}

impl Inflows {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.external.is_empty() && self.dry_weather.is_empty() && self.series.is_empty()
    }

    /// Checks every node, pattern, and time series reference.
    ///
    /// # Errors
    ///
    /// Returns an [`InflowError`] for the first reference that is missing or
    /// a dry-weather pattern whose kind does not match its slot.
    pub fn validate(&self, network: &Network, tables: &Tables) -> Result<(), InflowError> {
        let node = |index: usize| {
            network
                .node(index)
                .map(|_| ())
                .ok_or(InflowError::UnknownNode(index))
        };

        for inflow in &self.external {
            node(inflow.node)?;
            if let Some(index) = inflow.baseline_pattern {
                pattern(&self.patterns, index)?;
            }
            if let Some(index) = inflow.series {
                series(tables, index)?;
            }
        }
        for inflow in &self.dry_weather {
            node(inflow.node)?;
            for (slot, index) in inflow.slots() {
                let Some(index) = index else { continue };
                let found = pattern(&self.patterns, index)?.kind();
                if found != slot {
                    return Err(InflowError::WrongPatternKind { index, slot, found });
                }
            }
        }
        for inflow in &self.series {
            node(inflow.node)?;
            series(tables, inflow.series)?;
        }
        Ok(())
    }

    /// Calls `add(node, category, flow)` for every inflow at `days`.
    ///
    /// # Errors
    ///
    /// Returns an [`InflowError`] if a pattern or time series is missing or
    /// a lookup fails.
    pub fn for_each_flow(
        &self,
        days: f64,
        when: PatternTime,
        tables: &Tables,
        mut add: impl FnMut(usize, InflowCategory, f64),
    ) -> Result<(), InflowError> {
        for inflow in &self.external {
            let flow = inflow.flow_at(days, when, &self.patterns, tables)?;
            add(inflow.node, InflowCategory::External, flow);
        }
        for inflow in &self.dry_weather {
            let flow = inflow.flow_at(when, &self.patterns)?;
            add(inflow.node, InflowCategory::DryWeather, flow);
        }
        for inflow in &self.series {
            let flow = series(tables, inflow.series)?.value_at(days)?;
            add(inflow.node, inflow.category, flow);
        }
        Ok(())
    }
}

fn pattern(patterns: &[Pattern], index: usize) -> Result<&Pattern, InflowError> {
    patterns.get(index).ok_or(InflowError::UnknownPattern(index))
}

fn series(tables: &Tables, index: usize) -> Result<&sluice_core::TimeSeries, InflowError> {
    tables.series(index).ok_or(InflowError::UnknownSeries(index))
}
