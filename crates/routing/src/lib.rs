//! Time-step scheduling for the Sluice drainage simulation core.
//!
//! A [`Scheduler`] advances a [`Model`] one routing step at a time:
//!
//! 1. half of the previous step's flows are booked in the [`MassBalance`]
//! 2. pump limits and [`ControlEngine`] rules update link settings
//! 3. the clock advances and lateral inflows are gathered from [`Inflows`],
//!    the [`Runoff`] model, and the [`Coupling`] cache
//! 4. unless the system is steady or idle between routing events, a
//!    [`FlowRouter`] solves the network hydraulics
//! 5. losses and outflows are booked and the second half step closes out
//!
//! [`Simulation`] wraps a scheduler with start, step, and end calls that
//! report an [`ErrorCode`], and [`SimulationOptions`] can be read from TOML.
//!
//! The hydraulic solver and the runoff model are collaborators supplied by
//! the caller through the [`FlowRouter`] and [`Runoff`] traits.
//!
//! [`ControlEngine`]: sluice_controls::ControlEngine

pub mod event;
pub mod inflow;
pub mod massbal;
pub mod options;
pub mod scheduler;
pub mod stats;

mod coupling;
mod error;
mod model;
mod router;
mod run;
mod runoff;

pub use coupling::Coupling;
pub use error::RoutingError;
pub use event::{Event, EventSchedule};
pub use inflow::{
    DryWeatherInflow, ExternalInflow, InflowError, Inflows, Pattern, PatternTime, SeriesInflow,
};
pub use massbal::{BalanceEntry, FlowTotals, InflowCategory, MassBalance};
pub use model::Model;
pub use options::{EventWindow, OptionsError, SimulationOptions};
pub use router::{FlowRouter, RouteOutcome};
pub use run::{ErrorCode, RunSummary, Simulation};
pub use runoff::{Runoff, RunoffInflow};
pub use scheduler::{Scheduler, StepSummary};
pub use stats::{RoutingStats, StepKind};
