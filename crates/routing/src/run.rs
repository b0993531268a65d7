//! Start, step, and end a simulation run.

use sluice_controls::{ActionReport, ControlEngine, Rule};
use sluice_core::time::MSEC_PER_DAY;

use crate::{
    Coupling, FlowRouter, FlowTotals, Model, RoutingError, RoutingStats, Runoff, Scheduler,
    SimulationOptions,
};

/// Integer status of a run, zero on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    /// A step or end was requested before the run started.
    NotStarted = 1,
    /// The run was started twice.
    AlreadyStarted = 2,
    /// The routing step was not positive.
    InvalidStep = 3,
    /// Runoff stopped advancing.
    RunoffStalled = 4,
    /// The run options are invalid.
    Options = 5,
    /// An inflow could not be evaluated.
    Inflow = 6,
    /// A control rule could not be evaluated.
    Controls = 7,
    /// A curve or time series lookup failed.
    Table = 8,
    /// The clock left the supported calendar range.
    Calendar = 9,
    /// The flow router failed.
    Router = 10,
    /// The runoff model failed.
    Runoff = 11,
}

impl From<&RoutingError> for ErrorCode {
    fn from(err: &RoutingError) -> Self {
        match err {
            RoutingError::NotStarted => Self::NotStarted,
            RoutingError::AlreadyStarted => Self::AlreadyStarted,
            RoutingError::InvalidStep(_) => Self::InvalidStep,
            RoutingError::RunoffStalled(_) => Self::RunoffStalled,
            RoutingError::Options(_) => Self::Options,
            RoutingError::Inflow(_) => Self::Inflow,
            RoutingError::Controls(_) => Self::Controls,
            RoutingError::Table(_) => Self::Table,
            RoutingError::Calendar(_) => Self::Calendar,
            RoutingError::Router(_) => Self::Router,
            RoutingError::Runoff(_) => Self::Runoff,
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code as i32
    }
}

/// Results reported when a run ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Percent flow routing continuity error.
    pub routing_error: f64,
    /// Cumulative inflow, outflow, and loss volumes (ft³).
    pub totals: FlowTotals,
    pub init_storage: f64,
    pub final_storage: f64,
    pub stats: RoutingStats,
}

/// A model, its collaborators, and the state of a run over it.
///
/// ```ignore
/// let mut sim = Simulation::new(model, router, options).with_rules(rules);
/// sim.start()?;
/// while sim.step()? > 0.0 {}
/// let summary = sim.end()?;
/// ```
pub struct Simulation<F, R = ()> {
    model: Model,
    router: F,
    runoff: R,
    controls: ControlEngine,
    options: SimulationOptions,
    coupling: Coupling,
    scheduler: Option<Scheduler>,
    status: Option<(ErrorCode, String)>,
}

impl<F: FlowRouter> Simulation<F> {
    /// Creates a run without runoff or control rules.
    #[must_use]
    pub fn new(model: Model, router: F, options: SimulationOptions) -> Self {
        Self {
            model,
            router,
            runoff: (),
            controls: ControlEngine::new(Vec::new()),
            options,
            coupling: Coupling::new(),
            scheduler: None,
            status: None,
        }
    }
}

impl<F: FlowRouter, R: Runoff> Simulation<F, R> {
    /// Replaces the runoff model.
    #[must_use]
    pub fn with_runoff<U: Runoff>(self, runoff: U) -> Simulation<F, U> {
        Simulation {
            model: self.model,
            router: self.router,
            runoff,
            controls: self.controls,
            options: self.options,
            coupling: self.coupling,
            scheduler: self.scheduler,
            status: self.status,
        }
    }

    /// Sets the control rules, evaluated in the given order.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.controls = ControlEngine::new(rules);
        self
    }

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    #[must_use]
    pub fn router(&self) -> &F {
        &self.router
    }

    #[must_use]
    pub fn runoff(&self) -> &R {
        &self.runoff
    }

    #[must_use]
    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Returns a handle to this run's coupling cache.
    #[must_use]
    pub fn coupling(&self) -> Coupling {
        self.coupling.clone()
    }

    /// Returns the scheduler while the run is in progress.
    #[must_use]
    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Returns the status of the most recent operation.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        self.status.as_ref().map_or(ErrorCode::Success, |(code, _)| *code)
    }

    /// Describes the error behind a non-zero [`error_code`](Self::error_code).
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.status.as_ref().map(|(_, message)| message.as_str())
    }

    /// Removes and returns the control actions reported so far.
    pub fn take_action_reports(&mut self) -> Vec<ActionReport> {
        self.scheduler
            .as_mut()
            .map(Scheduler::take_action_reports)
            .unwrap_or_default()
    }

    /// Begins the run at the configured start time.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::AlreadyStarted`] if the run is in progress or
    /// an options error if the options are invalid.
    pub fn start(&mut self) -> Result<(), RoutingError> {
        let result = self.try_start();
        self.record(result)
    }

    fn try_start(&mut self) -> Result<(), RoutingError> {
        if self.scheduler.is_some() {
            return Err(RoutingError::AlreadyStarted);
        }
        let scheduler = Scheduler::new(&self.options, &self.model.network, self.controls.clone())?;
        log::info!(
            "starting run from {} to {} with {} rules",
            self.options.start,
            self.options.end,
            self.controls.rules().len()
        );
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Routes one step and returns the elapsed time in decimal days, or
    /// `0.0` once the run has reached its end.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NotStarted`] before [`start`](Self::start), or
    /// any error that halts routing.
    pub fn step(&mut self) -> Result<f64, RoutingError> {
        let result = self.try_step();
        self.record(result)
    }

    fn try_step(&mut self) -> Result<f64, RoutingError> {
        let scheduler = self.scheduler.as_mut().ok_or(RoutingError::NotStarted)?;

        if !scheduler.is_finished() {
            scheduler.advance(
                &mut self.model,
                &mut self.router,
                &mut self.runoff,
                &self.coupling,
            )?;
        }
        scheduler.advance_report_time();

        let elapsed_ms = scheduler.clock().elapsed_ms();
        Ok(if elapsed_ms < scheduler.total_ms() {
            elapsed_ms / MSEC_PER_DAY
        } else {
            0.0
        })
    }

    /// Ends the run and reports its mass balance and statistics.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NotStarted`] if no run is in progress.
    pub fn end(&mut self) -> Result<RunSummary, RoutingError> {
        let result = self.try_end();
        self.record(result)
    }

    fn try_end(&mut self) -> Result<RunSummary, RoutingError> {
        let scheduler = self.scheduler.take().ok_or(RoutingError::NotStarted)?;
        let network = &self.model.network;
        let massbal = scheduler.mass_balance();
        let summary = RunSummary {
            routing_error: scheduler.routing_error(network),
            totals: *massbal.totals(),
            init_storage: massbal.init_storage(),
            final_storage: network.node_storage(),
            stats: scheduler.stats().clone(),
        };
        log::info!(
            "run ended after {} steps with {:.3}% routing error",
            summary.stats.steps,
            summary.routing_error
        );
        Ok(summary)
    }

    fn record<T>(&mut self, result: Result<T, RoutingError>) -> Result<T, RoutingError> {
        self.status = result
            .as_ref()
            .err()
            .map(|err| (ErrorCode::from(err), err.to_string()));
        result
    }
}
