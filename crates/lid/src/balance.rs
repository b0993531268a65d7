use crate::Fluxes;

/// Cumulative water balance of one LID unit.
///
/// All quantities are depths over the unit's area (ft).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaterBalance {
    pub inflow: f64,
    pub evap: f64,
    /// Exfiltration into native soil.
    pub infil: f64,
    pub surface_flow: f64,
    pub drain_flow: f64,
    pub init_vol: f64,
    pub final_vol: f64,
}

impl WaterBalance {
    /// Starts a balance with `init_vol` already stored in the unit.
    #[must_use]
    pub fn new(init_vol: f64) -> Self {
        Self {
            init_vol,
            final_vol: init_vol,
            ..Self::default()
        }
    }

    /// Adds one step of flows and records the volume left in the unit.
    pub(crate) fn record(&mut self, fluxes: &Fluxes, dt: f64, final_vol: f64) {
        self.inflow += fluxes.surface_inflow * dt;
        self.evap += fluxes.total_evap() * dt;
        self.infil += fluxes.storage_exfil * dt;
        self.surface_flow += fluxes.surface_outflow * dt;
        self.drain_flow += fluxes.storage_drain * dt;
        self.final_vol = final_vol;
    }

    /// Returns water in minus water out minus the change in storage.
    #[must_use]
    pub fn residual(&self) -> f64 {
        self.inflow + self.init_vol
            - (self.evap + self.infil + self.surface_flow + self.drain_flow + self.final_vol)
    }

    /// Returns the residual as a percentage of the water supplied.
    #[must_use]
    pub fn percent_error(&self) -> f64 {
        let supplied = self.inflow + self.init_vol;
        if supplied > 0.0 {
            100.0 * self.residual() / supplied
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn accumulates_depths() {
        let mut balance = WaterBalance::new(0.5);
        let fluxes = Fluxes {
            surface_inflow: 1.0e-3,
            surface_evap: 1.0e-4,
            storage_exfil: 2.0e-4,
            surface_outflow: 3.0e-4,
            storage_drain: 1.0e-4,
            ..Fluxes::default()
        };

        balance.record(&fluxes, 100.0, 0.53);

        assert_relative_eq!(balance.inflow, 0.1);
        assert_relative_eq!(balance.evap, 0.01);
        assert_relative_eq!(balance.infil, 0.02);
        assert_relative_eq!(balance.surface_flow, 0.03);
        assert_relative_eq!(balance.drain_flow, 0.01);
        assert_relative_eq!(balance.residual(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(balance.percent_error(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_balance_has_no_error() {
        assert_relative_eq!(WaterBalance::default().percent_error(), 0.0);
    }
}
