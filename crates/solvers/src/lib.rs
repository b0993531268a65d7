//! Numerical integrators for the Sluice simulation core.
//!
//! Both integrators work on caller-owned state slices and take the
//! derivative function as a closure, so they are reentrant and hold no
//! state between calls.
//!
//! - [`transient::cash_karp`] — adaptive Runge-Kutta-Cash-Karp 5(4) with
//!   embedded error control, for smooth systems over an interval
//! - [`transient::puls`] — bounded modified-Puls fixed-point iteration over
//!   one step, for stiff states with hard physical limits

pub mod transient;
