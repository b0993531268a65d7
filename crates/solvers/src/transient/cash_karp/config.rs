use super::ConfigError;

/// Configuration for the Cash-Karp integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    accuracy: f64,
    initial_step: f64,
    max_steps: usize,
}

impl Config {
    /// Default cap on the number of steps per integration.
    pub const DEFAULT_MAX_STEPS: usize = 10_000;

    /// Creates a config with the given relative accuracy and first trial step.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is not finite and positive.
    pub fn new(accuracy: f64, initial_step: f64) -> Result<Self, ConfigError> {
        if !accuracy.is_finite() || accuracy <= 0.0 {
            return Err(ConfigError::Accuracy);
        }
        if !initial_step.is_finite() || initial_step <= 0.0 {
            return Err(ConfigError::InitialStep);
        }
        Ok(Self {
            accuracy,
            initial_step,
            max_steps: Self::DEFAULT_MAX_STEPS,
        })
    }

    /// Sets the maximum number of steps.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_steps` is zero.
    pub fn with_max_steps(mut self, max_steps: usize) -> Result<Self, ConfigError> {
        if max_steps == 0 {
            return Err(ConfigError::MaxSteps);
        }
        self.max_steps = max_steps;
        Ok(self)
    }

    /// Returns the target relative accuracy.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Returns the first trial step size.
    #[must_use]
    pub fn initial_step(&self) -> f64 {
        self.initial_step
    }

    /// Returns the maximum number of steps.
    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }
}
