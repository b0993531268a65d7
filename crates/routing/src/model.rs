use sluice_core::{Network, Tables};

use crate::{InflowError, Inflows};

/// The static description of a drainage system plus its hydraulic state.
pub struct Model {
    pub network: Network,
    pub tables: Tables,
    pub inflows: Inflows,
}

impl Model {
    /// Bundles a network with its tables and inflows.
    ///
    /// # Errors
    ///
    /// Returns an [`InflowError`] if an inflow refers to a node, pattern, or
    /// time series that does not exist.
    pub fn new(network: Network, tables: Tables, inflows: Inflows) -> Result<Self, InflowError> {
        inflows.validate(&network, &tables)?;
        Ok(Self {
            network,
            tables,
            inflows,
        })
    }
}
