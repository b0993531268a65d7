use sluice_core::Network;

use crate::RouteOutcome;

/// Summary statistics gathered while routing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingStats {
    /// Routing steps taken, including steady and between-event steps.
    pub steps: usize,
    /// Steps whose hydraulic solve was skipped as steady.
    pub steady_steps: usize,
    /// Steps that fell between routing events.
    pub idle_steps: usize,
    /// Steps whose hydraulic solve did not converge.
    pub non_converged: usize,
    /// Total iterations reported by the flow router.
    pub iterations: usize,
    /// Shortest and longest routing step (s).
    pub min_step: Option<f64>,
    pub max_step: Option<f64>,
    /// Largest depth reached at each node (ft).
    pub max_node_depth: Vec<f64>,
    /// Largest absolute flow through each link (cfs).
    pub max_link_flow: Vec<f64>,
}

impl RoutingStats {
    #[must_use]
    pub fn new(network: &Network) -> Self {
        Self {
            max_node_depth: vec![0.0; network.nodes().len()],
            max_link_flow: vec![0.0; network.links().len()],
            ..Self::default()
        }
    }

    /// Records a step of `seconds` and the network state it produced.
    pub fn record(&mut self, seconds: f64, outcome: StepKind, network: &Network) {
        self.steps += 1;
        self.min_step = Some(self.min_step.map_or(seconds, |min| min.min(seconds)));
        self.max_step = Some(self.max_step.map_or(seconds, |max| max.max(seconds)));

        match outcome {
            StepKind::Idle => self.idle_steps += 1,
            StepKind::Steady => self.steady_steps += 1,
            StepKind::Routed(outcome) => {
                self.iterations += outcome.iterations;
                if !outcome.converged {
                    self.non_converged += 1;
                }
            }
        }

        for (max, node) in self.max_node_depth.iter_mut().zip(network.nodes()) {
            *max = max.max(node.new_depth);
        }
        for (max, link) in self.max_link_flow.iter_mut().zip(network.links()) {
            *max = max.max(link.new_flow.abs());
        }
    }

    /// Returns the mean flow router iterations per routed step.
    #[must_use]
    pub fn mean_iterations(&self) -> f64 {
        let routed = self.steps - self.steady_steps - self.idle_steps;
        if routed == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let mean = self.iterations as f64 / routed as f64;
            mean
        }
    }
}

/// How a routing step was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Routing was suspended between events.
    Idle,
    /// The hydraulic solve was skipped because nothing changed.
    Steady,
    /// The flow router ran.
    Routed(RouteOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use sluice_core::{Link, LinkKind, Node, NodeKind};

    #[test]
    fn tracks_extremes_and_counts() {
        let mut network = Network::new(
            vec![
                Node::new("A", NodeKind::Junction),
                Node::new("B", NodeKind::Outfall { routes_to: None }),
            ],
            vec![Link::new("C", LinkKind::conduit(), 0, 1)],
        )
        .unwrap();
        let mut stats = RoutingStats::new(&network);

        network.nodes_mut()[0].new_depth = 2.0;
        network.links_mut()[0].new_flow = -3.0;
        let routed = RouteOutcome {
            iterations: 4,
            converged: false,
        };
        stats.record(30.0, StepKind::Routed(routed), &network);

        network.nodes_mut()[0].new_depth = 1.0;
        stats.record(10.0, StepKind::Steady, &network);
        stats.record(60.0, StepKind::Idle, &network);

        assert_eq!(stats.steps, 3);
        assert_eq!(stats.steady_steps, 1);
        assert_eq!(stats.idle_steps, 1);
        assert_eq!(stats.non_converged, 1);
        assert_eq!(stats.min_step, Some(10.0));
        assert_eq!(stats.max_step, Some(60.0));
        assert_relative_eq!(stats.max_node_depth[0], 2.0);
        assert_relative_eq!(stats.max_link_flow[0], 3.0);
        assert_relative_eq!(stats.mean_iterations(), 4.0);
    }
}
