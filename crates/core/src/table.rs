//! Curves and time series.
//!
//! Both are piecewise-linear tables evaluated with [`ninterp`]. Lookups
//! outside the tabulated range return the nearest end value, which is how
//! control curves and inflow time series are expected to behave.

use ndarray::Array1;
use ninterp::{
    error::{InterpolateError, ValidateError},
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use thiserror::Error;

/// Errors raised when building or evaluating a table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table `{0}` has no points")]
    Empty(String),

    #[error("table `{name}` has {x} x values but {y} y values")]
    LengthMismatch { name: String, x: usize, y: usize },

    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}

/// A piecewise-linear table with clamped ends.
enum Shape {
    /// A single point, constant everywhere.
    Constant(f64),
    Linear(Interp1DOwned<f64, Linear>),
}

impl Shape {
    fn new(name: &str, x: Vec<f64>, y: Vec<f64>) -> Result<Self, TableError> {
        if x.len() != y.len() {
            return Err(TableError::LengthMismatch {
                name: name.to_owned(),
                x: x.len(),
                y: y.len(),
            });
        }
        match y.as_slice() {
            [] => Err(TableError::Empty(name.to_owned())),
            [only] => Ok(Self::Constant(*only)),
            _ => Ok(Self::Linear(Interp1DOwned::new(
                Array1::from(x),
                Array1::from(y),
                Linear,
                Extrapolate::Clamp,
            )?)),
        }
    }

    fn lookup(&self, x: f64) -> Result<f64, TableError> {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Linear(interp) => Ok(interp.interpolate(&[x])?),
        }
    }
}

/// A named x–y curve, such as a control curve mapping a controller value to
/// a link setting.
pub struct Curve {
    name: String,
    shape: Shape,
}

impl Curve {
    /// Creates a curve from strictly increasing `x` values and matching `y` values.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty, the lengths differ, or `x`
    /// is not strictly increasing.
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, TableError> {
        let name = name.into();
        let shape = Shape::new(&name, x, y)?;
        Ok(Self { name, shape })
    }

    /// Returns the curve's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the curve at `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if interpolation fails (e.g. `x` is NaN).
    pub fn lookup(&self, x: f64) -> Result<f64, TableError> {
        self.shape.lookup(x)
    }
}

/// A named time series keyed by date-time in decimal days.
pub struct TimeSeries {
    name: String,
    shape: Shape,
}

impl TimeSeries {
    /// Creates a time series from increasing decimal-day times and values.
    ///
    /// # Errors
    ///
    /// Returns an error if the series is empty, the lengths differ, or the
    /// times are not strictly increasing.
    pub fn new(
        name: impl Into<String>,
        times: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        let shape = Shape::new(&name, times, values)?;
        Ok(Self { name, shape })
    }

    /// Returns the series name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value at the decimal-day date-time `when`.
    ///
    /// # Errors
    ///
    /// Returns an error if interpolation fails.
    pub fn value_at(&self, when: f64) -> Result<f64, TableError> {
        self.shape.lookup(when)
    }
}

/// The curves and time series of a model, addressed by index.
#[derive(Default)]
pub struct Tables {
    curves: Vec<Curve>,
    series: Vec<TimeSeries>,
}

impl Tables {
    /// Creates an empty set of tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a curve and returns its index.
    pub fn add_curve(&mut self, curve: Curve) -> usize {
        self.curves.push(curve);
        self.curves.len() - 1
    }

    /// Adds a time series and returns its index.
    pub fn add_series(&mut self, series: TimeSeries) -> usize {
        self.series.push(series);
        self.series.len() - 1
    }

    /// Returns the index of the curve named `name` (case-insensitive).
    #[must_use]
    pub fn find_curve(&self, name: &str) -> Option<usize> {
        self.curves
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the index of the time series named `name` (case-insensitive).
    #[must_use]
    pub fn find_series(&self, name: &str) -> Option<usize> {
        self.series
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Returns the curve at `index`.
    #[must_use]
    pub fn curve(&self, index: usize) -> Option<&Curve> {
        self.curves.get(index)
    }

    /// Returns the time series at `index`.
    #[must_use]
    pub fn series(&self, index: usize) -> Option<&TimeSeries> {
        self.series.get(index)
    }
}
