//! Run options, loadable from TOML.

use jiff::civil::{DateTime, date};
use serde::Deserialize;
use sluice_core::{FlowUnits, RoutingStep, RoutingStepError};
use thiserror::Error;
use uom::si::{f64::Time, time::second};

/// Errors raised while loading or validating [`SimulationOptions`].
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid options file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("end {end} is not after start {start}")]
    EmptyRun { start: DateTime, end: DateTime },

    #[error("routing step: {0}")]
    RoutingStep(#[source] RoutingStepError),

    #[error("report step: {0}")]
    ReportStep(#[source] RoutingStepError),

    #[error("routing event ends at {end}, before it starts at {start}")]
    BackwardEvent { start: DateTime, end: DateTime },

    #[error("{name} must be finite and non-negative, got {value}")]
    Tolerance { name: &'static str, value: f64 },
}

/// A window of time during which flow routing must run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventWindow {
    pub start: DateTime,
    pub end: DateTime,
}

/// Options that control a simulation run.
///
/// Every field has a default, so an options file only lists what it
/// changes. Steps are written in seconds and date-times as ISO 8601 strings:
///
/// ```
/// use sluice_routing::SimulationOptions;
///
/// let options = SimulationOptions::from_toml_str(r#"
///     start = "2024-07-04T00:00:00"
///     end = "2024-07-05T00:00:00"
///     routing_step = 30.0
///     skip_steady_state = true
/// "#).unwrap();
///
/// assert_eq!(options.routing_step().unwrap().seconds(), 30.0);
/// assert!(options.skip_steady_state);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationOptions {
    pub start: DateTime,
    pub end: DateTime,
    /// Fixed routing step, offered to the flow router's step policy.
    pub routing_step: Time,
    /// Interval between reporting times.
    pub report_step: Time,
    /// Skip the hydraulic solve while inflows and controls are steady.
    pub skip_steady_state: bool,
    /// Relative system flow error below which a step may count as steady.
    pub sys_flow_tol: f64,
    /// Relative change in a node's lateral inflow that breaks steady state.
    pub lat_flow_tol: f64,
    /// Report every fixed-value control action that changes a link.
    pub report_controls: bool,
    pub flow_units: FlowUnits,
    /// Keep a history of every half-step mass balance update.
    pub record_mass_balance: bool,
    /// Windows outside of which flow routing is skipped.
    pub events: Vec<EventWindow>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            start: date(2000, 1, 1).at(0, 0, 0, 0),
            end: date(2000, 1, 2).at(0, 0, 0, 0),
            routing_step: Time::new::<second>(20.0),
            report_step: Time::new::<second>(900.0),
            skip_steady_state: false,
            sys_flow_tol: 0.05,
            lat_flow_tol: 0.05,
            report_controls: false,
            flow_units: FlowUnits::Cfs,
            record_mass_balance: false,
            events: Vec::new(),
        }
    }
}

impl SimulationOptions {
    /// Parses options from TOML text and validates them.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionsError`] if the text is not valid TOML for these
    /// options or if [`validate`](Self::validate) rejects them.
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks that the run is non-empty and its steps and tolerances usable.
    ///
    /// # Errors
    ///
    /// Returns the first problem found as an [`OptionsError`].
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.end <= self.start {
            return Err(OptionsError::EmptyRun {
                start: self.start,
                end: self.end,
            });
        }
        self.routing_step()?;
        self.report_step()?;
        for (name, value) in [
            ("sys_flow_tol", self.sys_flow_tol),
            ("lat_flow_tol", self.lat_flow_tol),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OptionsError::Tolerance { name, value });
            }
        }
        if let Some(event) = self.events.iter().find(|event| event.end < event.start) {
            return Err(OptionsError::BackwardEvent {
                start: event.start,
                end: event.end,
            });
        }
        Ok(())
    }

    /// Returns the fixed routing step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is not positive and finite.
    pub fn routing_step(&self) -> Result<RoutingStep, OptionsError> {
        RoutingStep::from_time(self.routing_step).map_err(OptionsError::RoutingStep)
    }

    /// Returns the reporting interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is not positive and finite.
    pub fn report_step(&self) -> Result<RoutingStep, OptionsError> {
        RoutingStep::from_time(self.report_step).map_err(OptionsError::ReportStep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn defaults_fill_missing_fields() {
        let options = SimulationOptions::from_toml_str("").unwrap();
        assert_eq!(options, SimulationOptions::default());
        assert_relative_eq!(options.routing_step().unwrap().seconds(), 20.0);
        assert_relative_eq!(options.report_step().unwrap().seconds(), 900.0);
    }

    #[test]
    fn reads_every_section() {
        let options = SimulationOptions::from_toml_str(
            r#"
            start = "2024-07-04T06:00:00"
            end = "2024-07-06T00:00:00"
            routing_step = 5
            report_step = 300.0
            sys_flow_tol = 0.02
            report_controls = true
            flow_units = "LPS"
            record_mass_balance = true

            [[events]]
            start = "2024-07-04T12:00:00"
            end = "2024-07-04T18:00:00"
            "#,
        )
        .unwrap();

        assert_eq!(options.start, date(2024, 7, 4).at(6, 0, 0, 0));
        assert_relative_eq!(options.routing_step().unwrap().seconds(), 5.0);
        assert_relative_eq!(options.sys_flow_tol, 0.02);
        assert_eq!(options.flow_units, FlowUnits::Lps);
        assert!(options.report_controls && options.record_mass_balance);
        assert_eq!(options.events.len(), 1);
        assert_eq!(options.events[0].end, date(2024, 7, 4).at(18, 0, 0, 0));
    }

    #[test]
    fn rejects_unusable_options() {
        assert!(matches!(
            SimulationOptions::from_toml_str("routing_step = 0.0"),
            Err(OptionsError::RoutingStep(_))
        ));
        assert!(matches!(
            SimulationOptions::from_toml_str(r#"end = "1999-12-31T00:00:00""#),
            Err(OptionsError::EmptyRun { .. })
        ));
        assert!(matches!(
            SimulationOptions::from_toml_str("lat_flow_tol = -1.0"),
            Err(OptionsError::Tolerance {
                name: "lat_flow_tol",
                ..
            })
        ));
        assert!(matches!(
            SimulationOptions::from_toml_str("route_step = 5.0"),
            Err(OptionsError::Toml(_))
        ));
    }
}
