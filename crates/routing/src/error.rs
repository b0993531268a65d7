use std::error::Error as StdError;

use sluice_controls::EngineError;
use sluice_core::{RoutingStepError, TableError, time::CalendarError};

use crate::{InflowError, OptionsError};

/// Errors that halt a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("simulation has not been started")]
    NotStarted,

    #[error("simulation is already running")]
    AlreadyStarted,

    #[error("invalid routing time step: {0}")]
    InvalidStep(#[from] RoutingStepError),

    #[error("runoff did not advance past {0} ms")]
    RunoffStalled(f64),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Inflow(#[from] InflowError),

    #[error("control rule evaluation failed: {0}")]
    Controls(#[from] EngineError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("flow router error: {0}")]
    Router(#[source] Box<dyn StdError + Send + Sync>),

    #[error("runoff error: {0}")]
    Runoff(#[source] Box<dyn StdError + Send + Sync>),
}

impl RoutingError {
    pub(crate) fn router<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Router(Box::new(err))
    }

    pub(crate) fn runoff<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Runoff(Box::new(err))
    }
}
