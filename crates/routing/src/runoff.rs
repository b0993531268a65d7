use std::{convert::Infallible, error::Error as StdError};

use crate::{Coupling, InflowCategory};

/// Runoff-driven flow into a node at the runoff model's last two time points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunoffInflow {
    pub node: usize,
    pub category: InflowCategory,
    /// Flow (cfs) at the runoff model's old time.
    pub old: f64,
    /// Flow (cfs) at the runoff model's new time.
    pub new: f64,
}

impl RunoffInflow {
    /// Interpolates the flow at `fraction` of the way from old to new.
    #[must_use]
    pub fn at(&self, fraction: f64) -> f64 {
        (1.0 - fraction) * self.old + fraction * self.new
    }
}

/// The runoff model that produces wet-weather, groundwater, and LID drain
/// flows for the routing network.
///
/// Runoff advances on its own time step. The scheduler runs it until its
/// new time reaches the end of the upcoming routing step, then interpolates
/// its flows at the start of that step.
pub trait Runoff {
    type Error: StdError + Send + Sync + 'static;

    /// Returns `false` if the model has no runoff component.
    fn is_active(&self) -> bool {
        true
    }

    /// Elapsed time (ms) of the previous runoff computation.
    fn old_time_ms(&self) -> f64;

    /// Elapsed time (ms) of the latest runoff computation.
    fn new_time_ms(&self) -> f64;

    /// Advances runoff by one of its own time steps.
    ///
    /// Rainfall overrides in `coupling` replace gauge rainfall.
    ///
    /// # Errors
    ///
    /// Returns an error if the runoff step fails.
    fn execute(&mut self, coupling: &Coupling) -> Result<(), Self::Error>;

    /// Appends the runoff flows into each receiving node to `out`.
    fn inflows(&self, out: &mut Vec<RunoffInflow>);
}

/// No runoff.
impl Runoff for () {
    type Error = Infallible;

    fn is_active(&self) -> bool {
        false
    }

    fn old_time_ms(&self) -> f64 {
        0.0
    }

    fn new_time_ms(&self) -> f64 {
        f64::INFINITY
    }

    fn execute(&mut self, _coupling: &Coupling) -> Result<(), Self::Error> {
        Ok(())
    }

    fn inflows(&self, _out: &mut Vec<RunoffInflow>) {}
}
