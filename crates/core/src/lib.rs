//! Shared state and utilities for the Sluice drainage simulation core.
//!
//! This crate defines the data that the scheduler, control engine, and LID
//! solver all read or mutate:
//!
//! - [`Network`] — nodes and links with their old/new hydraulic state
//! - [`SimClock`] and [`RoutingStep`] — simulation time in decimal days and a
//!   strictly positive, unit-safe routing step
//! - [`Curve`], [`TimeSeries`], and [`Tables`] — interpolated lookup tables
//! - [`UnitSystem`] and [`FlowUnits`] — conversion factors between internal
//!   (feet, seconds) and user units
//! - [`Observer`] — receives solver events and optionally returns control actions

pub mod network;
pub mod table;
pub mod time;
pub mod units;

mod observer;

pub use network::{Link, LinkKind, Network, NetworkError, Node, NodeKind};
pub use observer::Observer;
pub use table::{Curve, TableError, Tables, TimeSeries};
pub use time::{RoutingStep, RoutingStepError, SimClock};
pub use units::{FlowUnits, UnitSystem};

/// Sentinel for "effectively zero" comparisons on flows and errors.
pub const TINY: f64 = 1.0e-6;

/// Flow rate (cfs) below which a computed inflow is treated as zero.
pub const FLOW_TOL: f64 = 1.0e-5;
