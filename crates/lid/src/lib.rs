//! Layered water-balance solver for low impact development (LID) units.
//!
//! A [`LidProcess`] describes a generic LID design per unit of area: its
//! [`LidKind`] and the parameters of each of its layers. A [`LidUnit`]
//! places a process over a specific area and carries the mutable layer
//! state, the previous step's flux rates, and a cumulative [`WaterBalance`].
//!
//! Each call to [`LidUnit::get_outflow`] computes inter-layer flux rates
//! with the strategy for the unit's kind and advances the layer states with
//! a bounded modified-Puls iteration from [`sluice_solvers::transient::puls`].
//!
//! [`LidReporter`] writes a fixed-width record per reporting interval,
//! suppressing duplicate rows across consecutive dry periods.

pub mod balance;
pub mod process;
pub mod report;
pub mod unit;

mod flux;

pub use balance::WaterBalance;
pub use flux::Fluxes;
pub use process::{
    Drain, DrainMat, LidDesign, LidKind, LidProcess, PavementLayer, ProcessError, SoilLayer,
    StorageLayer, SurfaceLayer,
};
pub use report::{LidReporter, ReportError};
pub use unit::{Forcing, LayerState, LidOutflow, LidUnit, UnitError};

/// Convergence tolerance on layer levels (ft, or moisture fraction).
pub const STOP_TOL: f64 = 0.00328;

/// Flow rate (ft/s) below which a unit is considered dry.
pub const MIN_FLOW: f64 = 2.3e-8;
