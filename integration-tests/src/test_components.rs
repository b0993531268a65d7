//! Collaborators and scenario files shared by the end-to-end tests.

pub mod router {
    use std::convert::Infallible;

    use sluice_core::{LinkKind, Network, Node, NodeKind, RoutingStep};
    use sluice_routing::{FlowRouter, RouteOutcome};

    /// A mock hydraulic solver that treats every node as a tank.
    ///
    /// Regulators and conduits discharge `coefficient · setting · √depth`
    /// from their upstream tank, pumps discharge `pump_rate · setting`, and
    /// no link removes more water than its tank holds. Links must be listed
    /// upstream first.
    pub struct TankRouter {
        /// Plan area of every tank (ft²).
        pub area: f64,
        pub coefficient: f64,
        /// Pump capacity at a setting of 1 (cfs).
        pub pump_rate: f64,
    }

    impl TankRouter {
        /// A node holding water to `depth` in one of this router's tanks.
        #[must_use]
        pub fn tank(&self, name: &str, kind: NodeKind, depth: f64) -> Node {
            let mut node = Node::new(name, kind).with_depth(depth);
            node.old_volume = depth * self.area;
            node.new_volume = node.old_volume;
            node
        }
    }

    impl FlowRouter for TankRouter {
        type Error = Infallible;

        fn execute(
            &mut self,
            network: &mut Network,
            step: RoutingStep,
        ) -> Result<RouteOutcome, Self::Error> {
            let dt = step.seconds();
            let mut outflow = vec![0.0; network.nodes().len()];

            for index in 0..network.links().len() {
                let link = network.links()[index].clone();
                let tank = &network.nodes()[link.node1];
                let available = tank.old_volume / dt + tank.inflow - outflow[link.node1];
                let capacity = match link.kind {
                    LinkKind::Pump { .. } => self.pump_rate * link.setting,
                    _ => self.coefficient * link.setting.clamp(0.0, 1.0) * tank.old_depth.sqrt(),
                };
                let flow = capacity.min(available).max(0.0);

                network.links_mut()[index].new_flow = flow;
                outflow[link.node1] += flow;
                network.nodes_mut()[link.node2].inflow += flow;
            }

            for (node, out) in network.nodes_mut().iter_mut().zip(outflow) {
                if node.is_outfall() {
                    continue;
                }
                if node.depth_set_externally {
                    node.new_volume = node.new_depth * self.area;
                    continue;
                }
                node.new_volume = (node.old_volume + (node.inflow - out) * dt).max(0.0);
                node.new_depth = node.new_volume / self.area;
            }

            Ok(RouteOutcome {
                iterations: 1,
                converged: true,
            })
        }
    }
}

pub mod runoff {
    use sluice_core::RoutingStep;
    use sluice_lid::{Forcing, LidProcess, LidUnit, UnitError};
    use sluice_routing::{Coupling, InflowCategory, Runoff, RunoffInflow};

    /// Runoff from a single LID unit whose surface and drain outflows feed
    /// one node. Rain falls at a steady rate until the storm ends, unless
    /// the coupling cache overrides rainfall for subcatchment 0.
    pub struct LidRunoff {
        pub process: LidProcess,
        pub unit: LidUnit,
        pub node: usize,
        pub step: RoutingStep,
        /// Rainfall rate during the storm (ft/s).
        pub rainfall: f64,
        /// Length of the storm (ms).
        pub storm_ms: f64,
        old_ms: f64,
        new_ms: f64,
        old_flow: f64,
        new_flow: f64,
    }

    impl LidRunoff {
        #[must_use]
        pub fn new(
            process: LidProcess,
            unit: LidUnit,
            node: usize,
            step: RoutingStep,
            rainfall: f64,
            storm_ms: f64,
        ) -> Self {
            Self {
                process,
                unit,
                node,
                step,
                rainfall,
                storm_ms,
                old_ms: 0.0,
                new_ms: 0.0,
                old_flow: 0.0,
                new_flow: 0.0,
            }
        }
    }

    impl Runoff for LidRunoff {
        type Error = UnitError;

        fn old_time_ms(&self) -> f64 {
            self.old_ms
        }

        fn new_time_ms(&self) -> f64 {
            self.new_ms
        }

        fn execute(&mut self, coupling: &Coupling) -> Result<(), Self::Error> {
            let scheduled = if self.new_ms < self.storm_ms {
                self.rainfall
            } else {
                0.0
            };
            let forcing = Forcing {
                inflow: coupling.rainfall(0).unwrap_or(scheduled),
                ..Forcing::default()
            };
            let outflow = self.unit.get_outflow(&self.process, &forcing, self.step)?;

            self.old_ms = self.new_ms;
            self.new_ms += self.step.millis();
            self.old_flow = self.new_flow;
            self.new_flow = (outflow.surface + outflow.drain) * self.unit.area();
            Ok(())
        }

        fn inflows(&self, out: &mut Vec<RunoffInflow>) {
            out.push(RunoffInflow {
                node: self.node,
                category: InflowCategory::WetWeather,
                old: self.old_flow,
                new: self.new_flow,
            });
        }
    }
}

pub mod scenario {
    use serde::Deserialize;
    use sluice_lid::LidDesign;
    use sluice_routing::SimulationOptions;

    /// Run options, control rules, and an optional LID design read from TOML.
    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct Scenario {
        #[serde(default)]
        pub rules: String,
        pub options: SimulationOptions,
        pub lid: Option<LidDesign>,
    }

    impl Scenario {
        /// Parses a scenario and validates its options.
        ///
        /// # Panics
        ///
        /// Panics if the text is not a valid scenario.
        #[must_use]
        pub fn load(text: &str) -> Self {
            let scenario: Self = toml::from_str(text).expect("scenario should parse");
            scenario.options.validate().expect("options should be valid");
            scenario
        }
    }
}
