use thiserror::Error;

/// Configuration for the modified-Puls iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_iters: usize,
    omega: f64,
}

/// Errors that can occur when validating a modified-Puls config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("omega must lie in [0, 1]")]
    Omega,

    #[error("max_iters must be at least 1")]
    MaxIters,
}

impl Config {
    /// Default iteration cap.
    pub const DEFAULT_MAX_ITERS: usize = 20;

    /// Creates a config with an iteration cap and old-rate weight `omega`.
    ///
    /// # Errors
    ///
    /// Returns an error if `omega` is outside `[0, 1]` or `max_iters` is zero.
    pub fn new(max_iters: usize, omega: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&omega) {
            return Err(ConfigError::Omega);
        }
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        Ok(Self { max_iters, omega })
    }

    /// Explicit Euler: new rates only, one pass.
    #[must_use]
    pub fn euler() -> Self {
        Self {
            max_iters: Self::DEFAULT_MAX_ITERS,
            omega: 0.0,
        }
    }

    /// Trapezoidal blend of old and new rates.
    #[must_use]
    pub fn trapezoidal() -> Self {
        Self {
            max_iters: Self::DEFAULT_MAX_ITERS,
            omega: 0.5,
        }
    }

    /// Returns the iteration cap.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the weight given to the previous step's rates.
    #[must_use]
    pub fn omega(&self) -> f64 {
        self.omega
    }
}
