use std::error::Error as StdError;

use sluice_core::{Network, RoutingStep};

/// The result of one hydraulic solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Iterations the solver needed.
    pub iterations: usize,
    /// Whether the solver met its convergence criteria.
    ///
    /// A solve that did not converge is reported but the step still stands.
    pub converged: bool,
}

/// A hydraulic solver that moves flow through the network's links.
///
/// The scheduler seeds each node's `inflow` with its lateral inflow and
/// saves old hydraulic state before calling [`execute`](Self::execute).
/// Nodes flagged `depth_set_externally` carry a depth the solver should
/// keep for the step.
pub trait FlowRouter {
    type Error: StdError + Send + Sync + 'static;

    /// Proposes the length of the next routing step in seconds.
    ///
    /// Solvers with a variable step override this; the default is the
    /// fixed step. The scheduler rejects a proposal that is not positive.
    fn step_seconds(&mut self, network: &Network, fixed: RoutingStep) -> f64 {
        let _ = network;
        fixed.seconds()
    }

    /// Sets each storage node's evaporation and exfiltration volume for a
    /// step of length `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if the losses cannot be computed.
    fn node_losses(&mut self, network: &mut Network, step: RoutingStep) -> Result<(), Self::Error> {
        let _ = (network, step);
        Ok(())
    }

    /// Routes flow through the network over `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if the solver cannot produce a state at all.
    fn execute(&mut self, network: &mut Network, step: RoutingStep)
    -> Result<RouteOutcome, Self::Error>;
}
