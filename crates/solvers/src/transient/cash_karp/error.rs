/// Errors that prevent the Cash-Karp integrator from starting.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("integration bounds must be finite, got [{x1}, {x2}]")]
    NonFiniteInterval { x1: f64, x2: f64 },

    #[error("initial state has a non-finite component at index {index}")]
    NonFiniteState { index: usize },
}

/// Errors raised when validating a Cash-Karp [`Config`](super::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("accuracy must be finite and positive")]
    Accuracy,

    #[error("initial step must be finite and positive")]
    InitialStep,

    #[error("max_steps must be at least 1")]
    MaxSteps,
}
