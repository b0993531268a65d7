//! The routing time-step loop.

use sluice_controls::{ActionReport, ControlEngine, StepTime};
use sluice_core::{
    FLOW_TOL, Link, Network, Node, NodeKind, RoutingStep, SimClock, TINY, Tables,
    time::{MSEC_PER_DAY, calendar},
};

use crate::{
    Coupling, EventSchedule, FlowRouter, InflowCategory, Inflows, MassBalance, Model,
    OptionsError, PatternTime, RouteOutcome, RoutingError, RoutingStats, Runoff, RunoffInflow,
    SimulationOptions, event::Event, stats::StepKind,
};

/// What happened during one routing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummary {
    /// Length of the step (s).
    pub seconds: f64,
    /// Elapsed time at the end of the step (ms).
    pub elapsed_ms: f64,
    pub kind: StepKind,
    /// Links whose setting changed at the start of the step.
    pub actions_taken: usize,
}

/// Advances a model through time one routing step at a time.
///
/// Each step evaluates control rules, gathers lateral inflows, routes flow
/// with a [`FlowRouter`] unless the network is steady or idle between
/// routing events, and books everything in the [`MassBalance`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    clock: SimClock,
    total_ms: f64,
    fixed_step: RoutingStep,
    report_step: RoutingStep,
    report_ms: f64,
    old_routing_ms: f64,
    events: EventSchedule,
    controls: ControlEngine,
    massbal: MassBalance,
    stats: RoutingStats,
    skip_steady_state: bool,
    sys_flow_tol: f64,
    lat_flow_tol: f64,
    action_reports: Vec<ActionReport>,
    runoff_inflows: Vec<RunoffInflow>,
}

impl Scheduler {
    /// Prepares to route `network` over the run described by `options`.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionsError`] if the options fail validation.
    pub fn new(
        options: &SimulationOptions,
        network: &Network,
        controls: ControlEngine,
    ) -> Result<Self, OptionsError> {
        options.validate()?;
        let fixed_step = options.routing_step()?;
        let report_step = options.report_step()?;
        let total_days =
            calendar::to_decimal_days(options.end) - calendar::to_decimal_days(options.start);
        let events = options.events.iter().map(Event::from).collect();

        Ok(Self {
            clock: SimClock::new(options.start),
            total_ms: (total_days * MSEC_PER_DAY).round(),
            fixed_step,
            report_step,
            report_ms: report_step.millis(),
            old_routing_ms: 0.0,
            events: EventSchedule::new(events),
            controls: controls
                .with_flow_units(options.flow_units)
                .with_action_reporting(options.report_controls),
            massbal: MassBalance::new(network.node_storage(), options.record_mass_balance),
            stats: RoutingStats::new(network),
            skip_steady_state: options.skip_steady_state,
            sys_flow_tol: options.sys_flow_tol,
            lat_flow_tol: options.lat_flow_tol,
            action_reports: Vec::new(),
            runoff_inflows: Vec::new(),
        })
    }

    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Returns the run length (ms).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.clock.elapsed_ms() >= self.total_ms
    }

    /// Returns the elapsed time (ms) of the next reporting time.
    #[must_use]
    pub fn report_ms(&self) -> f64 {
        self.report_ms
    }

    #[must_use]
    pub fn events(&self) -> &EventSchedule {
        &self.events
    }

    #[must_use]
    pub fn controls(&self) -> &ControlEngine {
        &self.controls
    }

    #[must_use]
    pub fn mass_balance(&self) -> &MassBalance {
        &self.massbal
    }

    #[must_use]
    pub fn stats(&self) -> &RoutingStats {
        &self.stats
    }

    /// Removes and returns the control actions reported so far.
    pub fn take_action_reports(&mut self) -> Vec<ActionReport> {
        std::mem::take(&mut self.action_reports)
    }

    /// Returns the percent routing continuity error of the run so far.
    #[must_use]
    pub fn routing_error(&self, network: &Network) -> f64 {
        self.massbal.close(network.node_storage())
    }

    /// Moves the reporting time forward once routing has reached it.
    ///
    /// Returns `true` if a reporting time was passed.
    pub fn advance_report_time(&mut self) -> bool {
        if self.clock.elapsed_ms() >= self.report_ms {
            self.report_ms += self.report_step.millis();
            true
        } else {
            false
        }
    }

    /// Chooses the length (s) of the next routing step.
    ///
    /// Between routing events the step leaps to the next runoff or reporting
    /// time, as long as that does not reach the next event. Otherwise the
    /// flow router's step policy decides.
    pub fn routing_step<F, R>(&self, router: &mut F, network: &Network, runoff: &R) -> f64
    where
        F: FlowRouter,
        R: Runoff,
    {
        if network.links().is_empty() {
            return self.fixed_step.seconds();
        }

        if self.events.is_between_events() {
            let now_ms = self.clock.elapsed_ms();
            let next_ms = if runoff.is_active() {
                runoff.new_time_ms().min(self.report_ms)
            } else {
                self.report_ms
            };
            let next_start = self.events.next_start();
            let next_days = self.clock.days_at(next_ms);
            if next_days > self.clock.days_at(now_ms) && next_days < next_start {
                return (next_ms - now_ms) / 1000.0;
            }
            if self.clock.days_at(now_ms + self.fixed_step.millis()) < next_start {
                return self.fixed_step.seconds();
            }
        }

        router.step_seconds(network, self.fixed_step)
    }

    /// Sizes the next step, runs runoff up to its end, and routes it.
    ///
    /// The last step is shortened so the run ends exactly on time.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidStep`] if the proposed step is not
    /// positive, [`RoutingError::RunoffStalled`] if runoff stops advancing,
    /// or any error raised while routing the step.
    pub fn advance<F, R>(
        &mut self,
        model: &mut Model,
        router: &mut F,
        runoff: &mut R,
        coupling: &Coupling,
    ) -> Result<StepSummary, RoutingError>
    where
        F: FlowRouter,
        R: Runoff,
    {
        let proposed = self.routing_step(router, &model.network, runoff);
        let mut step = RoutingStep::from_seconds(proposed).inspect_err(|err| {
            log::error!("stopping at {} ms: {err}", self.clock.elapsed_ms());
        })?;

        let now_ms = self.clock.elapsed_ms();
        let mut next_ms = now_ms + step.millis();
        if next_ms > self.total_ms {
            step = RoutingStep::from_seconds(((self.total_ms - now_ms) / 1000.0).max(0.001))?;
            next_ms = self.total_ms;
        }

        if runoff.is_active() {
            while runoff.new_time_ms() < next_ms {
                let before = runoff.new_time_ms();
                runoff.execute(coupling).map_err(RoutingError::runoff)?;
                if runoff.new_time_ms() <= before {
                    return Err(RoutingError::RunoffStalled(before));
                }
            }
        }

        self.execute(model, router, runoff, coupling, step)
    }

    /// Routes one step of length `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if control rules, inflow lookups, or a collaborator
    /// fail. A flow router that does not converge is logged, not an error.
    pub fn execute<F, R>(
        &mut self,
        model: &mut Model,
        router: &mut F,
        runoff: &R,
        coupling: &Coupling,
        step: RoutingStep,
    ) -> Result<StepSummary, RoutingError>
    where
        F: FlowRouter,
        R: Runoff,
    {
        let Model {
            network,
            tables,
            inflows,
        } = model;
        let seconds = step.seconds();

        self.massbal
            .update_totals(seconds / 2.0, self.clock.elapsed_days());
        coupling.apply_node_depths(network);

        // Controls, events, and inflows all see the start of the step.
        let now_days = self.clock.now_days();
        network.update_target_settings();
        let evaluation = self.controls.evaluate(
            network,
            tables,
            StepTime {
                now_days,
                elapsed_days: self.clock.elapsed_days(),
                step,
            },
        )?;
        self.action_reports.extend(evaluation.reports);
        let actions_taken = network.realize_target_settings(now_days);

        self.old_routing_ms = self.clock.elapsed_ms();
        self.clock.set_elapsed_ms(self.old_routing_ms + step.millis());

        let step_flow_error = self.massbal.step_flow_error();
        self.massbal.init_step();

        for node in network.nodes_mut() {
            node.old_lat_flow = node.new_lat_flow;
            node.new_lat_flow = 0.0;
        }

        let kind = if self.events.advance(now_days) {
            StepKind::Idle
        } else {
            router
                .node_losses(network, step)
                .map_err(RoutingError::router)?;
            self.add_lateral_inflows(network, tables, inflows, runoff, now_days)?;
            coupling.apply_lateral_inflows(network, &mut self.massbal);

            let steady = self.skip_steady_state
                && self.old_routing_ms > 0.0
                && actions_taken == 0
                && step_flow_error.abs() <= self.sys_flow_tol
                && !self.inflow_has_changed(network);

            let kind = if steady {
                StepKind::Steady
            } else {
                network.save_hydraulic_state();
                for node in network.nodes_mut() {
                    node.inflow = node.new_lat_flow.max(0.0);
                }
                let outcome = if network.links().is_empty() {
                    RouteOutcome {
                        iterations: 0,
                        converged: true,
                    }
                } else {
                    router.execute(network, step).map_err(RoutingError::router)?
                };
                if !outcome.converged {
                    log::warn!(
                        "flow routing did not converge in {} iterations at {} ms",
                        outcome.iterations,
                        self.clock.elapsed_ms()
                    );
                }
                StepKind::Routed(outcome)
            };

            self.remove_losses_and_outflows(network, seconds);
            kind
        };

        self.massbal
            .update_totals(seconds / 2.0, self.clock.elapsed_days());
        self.stats.record(seconds, kind, network);

        Ok(StepSummary {
            seconds,
            elapsed_ms: self.clock.elapsed_ms(),
            kind,
            actions_taken,
        })
    }

    /// Adds pattern, series, and runoff inflows to each node's lateral flow.
    ///
    /// Every source is evaluated at the start of the step, `now_days`, and
    /// runoff flows are interpolated there too.
    fn add_lateral_inflows<R: Runoff>(
        &mut self,
        network: &mut Network,
        tables: &Tables,
        inflows: &Inflows,
        runoff: &R,
        now_days: f64,
    ) -> Result<(), RoutingError> {
        let nodes = network.nodes_mut();

        if !inflows.is_empty() {
            let when = PatternTime::at(now_days)?;
            inflows.for_each_flow(now_days, when, tables, |node, category, flow| {
                add_lateral(nodes, &mut self.massbal, node, category, flow);
            })?;
        }

        if runoff.is_active() {
            let (old_ms, new_ms) = (runoff.old_time_ms(), runoff.new_time_ms());
            let fraction = if new_ms > old_ms {
                ((self.old_routing_ms - old_ms) / (new_ms - old_ms)).clamp(0.0, 1.0)
            } else {
                1.0
            };

            self.runoff_inflows.clear();
            runoff.inflows(&mut self.runoff_inflows);
            for inflow in &self.runoff_inflows {
                let flow = inflow.at(fraction);
                add_lateral(nodes, &mut self.massbal, inflow.node, inflow.category, flow);
            }
        }
        Ok(())
    }

    /// Checks whether any node's lateral inflow, or an outfall's or
    /// isolated node's total inflow, changed by more than the tolerance.
    fn inflow_has_changed(&self, network: &Network) -> bool {
        network.nodes().iter().any(|node| {
            relative_change(node.old_lat_flow, node.new_lat_flow) > self.lat_flow_tol
                || ((node.is_outfall() || node.degree == 0)
                    && relative_change(node.old_flow_inflow, node.inflow) > self.lat_flow_tol)
        })
    }

    fn remove_losses_and_outflows(&mut self, network: &mut Network, seconds: f64) {
        let (evap, exfil) = network
            .nodes()
            .iter()
            .filter(|node| node.is_storage())
            .fold((0.0, 0.0), |(evap, exfil), node| {
                (evap + node.evap_loss, exfil + node.exfil_loss)
            });
        self.massbal
            .add_node_losses(evap / seconds, exfil / seconds);

        let (evap, seep) = network
            .links()
            .iter()
            .map(Link::loss_rates)
            .fold((0.0, 0.0), |(evap, seep), (e, s)| (evap + e, seep + s));
        self.massbal.add_link_losses(evap, seep);

        for node in network.nodes_mut() {
            let (flow, flooded) = node.system_outflow();
            self.massbal.add_outflow(flow, flooded);
            if let NodeKind::Outfall {
                routes_to: Some(_),
            } = node.kind
            {
                node.routed_volume += flow.max(0.0) * seconds;
            }
        }
    }
}

fn add_lateral(
    nodes: &mut [Node],
    massbal: &mut MassBalance,
    node: usize,
    category: InflowCategory,
    flow: f64,
) {
    if flow.abs() < FLOW_TOL {
        return;
    }
    if let Some(node) = nodes.get_mut(node) {
        node.new_lat_flow += flow;
        massbal.add_inflow(category, flow);
    }
}

fn relative_change(old: f64, new: f64) -> f64 {
    if old.abs() > TINY {
        (new / old - 1.0).abs()
    } else if new.abs() > TINY {
        1.0
    } else {
        0.0
    }
}
