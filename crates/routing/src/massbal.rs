//! Flow routing mass balance.
//!
//! Rates are accumulated per step in cfs and integrated into cumulative
//! volumes (ft³) in two half-step updates, one before and one after the
//! step is routed.

use sluice_core::TINY;

/// The source a lateral inflow is booked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InflowCategory {
    DryWeather,
    WetWeather,
    Groundwater,
    Rdii,
    External,
}

/// Inflow, outflow, and loss quantities, either as rates or volumes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowTotals {
    pub dry_weather: f64,
    pub wet_weather: f64,
    pub groundwater: f64,
    pub rdii: f64,
    pub external: f64,
    pub flooding: f64,
    pub outflow: f64,
    pub evap_loss: f64,
    pub seep_loss: f64,
}

impl FlowTotals {
    /// Returns the sum of every inflow category.
    #[must_use]
    pub fn inflow(&self) -> f64 {
        self.dry_weather + self.wet_weather + self.groundwater + self.rdii + self.external
    }

    /// Returns the sum of outflow, flooding, and losses.
    #[must_use]
    pub fn outflow(&self) -> f64 {
        self.outflow + self.flooding + self.evap_loss + self.seep_loss
    }

    fn inflow_mut(&mut self, category: InflowCategory) -> &mut f64 {
        match category {
            InflowCategory::DryWeather => &mut self.dry_weather,
            InflowCategory::WetWeather => &mut self.wet_weather,
            InflowCategory::Groundwater => &mut self.groundwater,
            InflowCategory::Rdii => &mut self.rdii,
            InflowCategory::External => &mut self.external,
        }
    }

    fn add_scaled(&mut self, other: &Self, factor: f64) {
        self.dry_weather += other.dry_weather * factor;
        self.wet_weather += other.wet_weather * factor;
        self.groundwater += other.groundwater * factor;
        self.rdii += other.rdii * factor;
        self.external += other.external * factor;
        self.flooding += other.flooding * factor;
        self.outflow += other.outflow * factor;
        self.evap_loss += other.evap_loss * factor;
        self.seep_loss += other.seep_loss * factor;
    }
}

/// The step rates in effect at a half-step update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceEntry {
    pub elapsed_days: f64,
    pub rates: FlowTotals,
}

/// Running mass balance for flow routing.
#[derive(Debug, Clone, PartialEq)]
pub struct MassBalance {
    init_storage: f64,
    step: FlowTotals,
    totals: FlowTotals,
    history: Option<Vec<BalanceEntry>>,
}

impl MassBalance {
    /// Starts a balance with `init_storage` ft³ held in the network.
    ///
    /// With `record` set, every half-step update is kept as a [`BalanceEntry`].
    #[must_use]
    pub fn new(init_storage: f64, record: bool) -> Self {
        Self {
            init_storage,
            step: FlowTotals::default(),
            totals: FlowTotals::default(),
            history: record.then(Vec::new),
        }
    }

    /// Integrates the current step rates over `seconds`.
    ///
    /// Steps between routing events carry zero rates and still produce a
    /// history entry.
    pub fn update_totals(&mut self, seconds: f64, elapsed_days: f64) {
        self.totals.add_scaled(&self.step, seconds);
        if let Some(history) = &mut self.history {
            history.push(BalanceEntry {
                elapsed_days,
                rates: self.step,
            });
        }
    }

    /// Zeroes the step rates.
    pub fn init_step(&mut self) {
        self.step = FlowTotals::default();
    }

    /// Books a lateral inflow rate; a negative rate leaves the system.
    pub fn add_inflow(&mut self, category: InflowCategory, flow: f64) {
        if flow >= 0.0 {
            *self.step.inflow_mut(category) += flow;
        } else {
            self.step.outflow -= flow;
        }
    }

    /// Books a system outflow rate; a negative rate is reverse flow and
    /// counts as external inflow.
    pub fn add_outflow(&mut self, flow: f64, flooded: bool) {
        if flow < 0.0 {
            self.step.external -= flow;
        } else if flooded {
            self.step.flooding += flow;
        } else {
            self.step.outflow += flow;
        }
    }

    /// Books storage node evaporation and exfiltration rates.
    pub fn add_node_losses(&mut self, evap: f64, seep: f64) {
        self.step.evap_loss += evap;
        self.step.seep_loss += seep;
    }

    /// Books conduit evaporation and seepage rates.
    pub fn add_link_losses(&mut self, evap: f64, seep: f64) {
        self.step.evap_loss += evap;
        self.step.seep_loss += seep;
    }

    /// Returns the relative imbalance between inflow and outflow rates
    /// this step, or zero when there is no inflow to speak of.
    #[must_use]
    pub fn step_flow_error(&self) -> f64 {
        let inflow = self.step.inflow();
        if inflow.abs() <= TINY {
            return 0.0;
        }
        (inflow - self.step.outflow()) / inflow
    }

    /// Returns the percent routing continuity error given the volume left
    /// in the network at the end of the run.
    #[must_use]
    pub fn close(&self, final_storage: f64) -> f64 {
        let total_in = self.init_storage + self.totals.inflow();
        let total_out = self.totals.outflow() + final_storage;
        if total_in.abs() <= TINY {
            return 0.0;
        }
        100.0 * (1.0 - total_out / total_in)
    }

    #[must_use]
    pub fn init_storage(&self) -> f64 {
        self.init_storage
    }

    /// Returns this step's rates (cfs).
    #[must_use]
    pub fn step_rates(&self) -> &FlowTotals {
        &self.step
    }

    /// Returns the cumulative volumes (ft³).
    #[must_use]
    pub fn totals(&self) -> &FlowTotals {
        &self.totals
    }

    /// Returns the recorded half-step entries, if recording is enabled.
    #[must_use]
    pub fn history(&self) -> Option<&[BalanceEntry]> {
        self.history.as_deref()
    }
}
