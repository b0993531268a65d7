//! LID units: a process placed over a specific area.

use sluice_core::RoutingStep;
use sluice_solvers::transient::puls::{self, Bounds, Config, Status};
use thiserror::Error;

use crate::{
    flux::{self, FluxContext, LAYERS, PAVE, SOIL, STOR, SURF},
    Fluxes, LidKind, LidProcess, WaterBalance, STOP_TOL,
};

/// Water levels in each layer of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerState {
    /// Depth of ponded water on the surface (ft).
    pub surface_depth: f64,
    /// Depth of water in the pavement layer (ft).
    pub pave_depth: f64,
    /// Moisture content of the soil layer (fraction).
    pub soil_moisture: f64,
    /// Depth of water in the storage layer (ft).
    pub storage_depth: f64,
}

impl LayerState {
    fn to_array(self) -> [f64; LAYERS] {
        let mut x = [0.0; LAYERS];
        x[SURF] = self.surface_depth;
        x[SOIL] = self.soil_moisture;
        x[STOR] = self.storage_depth;
        x[PAVE] = self.pave_depth;
        x
    }

    fn from_array(x: &[f64; LAYERS]) -> Self {
        Self {
            surface_depth: x[SURF],
            pave_depth: x[PAVE],
            soil_moisture: x[SOIL],
            storage_depth: x[STOR],
        }
    }
}

/// External conditions over one step, as rates per unit area (ft/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Forcing {
    /// Rainfall plus runon captured by the unit.
    pub inflow: f64,
    /// Potential evaporation.
    pub evap: f64,
    /// Surface infiltration capacity, for kinds that infiltrate through
    /// their surface.
    pub infil: f64,
    /// Infiltration limit of the native soil beneath the unit.
    pub max_infil: f64,
}

/// Flows leaving a unit over one step (ft/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidOutflow {
    pub surface: f64,
    pub evap: f64,
    pub infil: f64,
    pub drain: f64,
    pub status: Status,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("unit area must be positive and finite, got {0}")]
    Area(f64),

    #[error("unit width must be non-negative and finite, got {0}")]
    Width(f64),

    #[error("initial saturation must lie in [0, 1], got {0}")]
    InitSat(f64),

    #[error("{field} must be non-negative and finite, got {value}")]
    Forcing { field: &'static str, value: f64 },
}

/// A replicate LID unit and its evolving state.
#[derive(Debug, Clone, PartialEq)]
pub struct LidUnit {
    area: f64,
    full_width: f64,
    state: LayerState,
    old_rates: [f64; LAYERS],
    dry_time: f64,
    fluxes: Fluxes,
    balance: WaterBalance,
}

impl LidUnit {
    /// Places `process` over `area` (ft²) with top width `full_width` (ft).
    ///
    /// Soil, pavement, and storage layers start `init_sat` of the way from
    /// empty (or wilting point, for soil) to full. The surface starts dry.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitError`] if the area is not positive, the width is
    /// negative, or `init_sat` lies outside `[0, 1]`.
    pub fn new(
        process: &LidProcess,
        area: f64,
        full_width: f64,
        init_sat: f64,
    ) -> Result<Self, UnitError> {
        if !area.is_finite() || area <= 0.0 {
            return Err(UnitError::Area(area));
        }
        if !full_width.is_finite() || full_width < 0.0 {
            return Err(UnitError::Width(full_width));
        }
        if !(0.0..=1.0).contains(&init_sat) {
            return Err(UnitError::InitSat(init_sat));
        }

        let soil = process.soil();
        let soil_moisture = if soil.thickness > 0.0 {
            soil.wilt_point + init_sat * (soil.porosity - soil.wilt_point)
        } else {
            0.0
        };
        let state = LayerState {
            surface_depth: 0.0,
            pave_depth: init_sat * process.pavement().thickness,
            soil_moisture,
            storage_depth: init_sat * process.storage().thickness,
        };

        let init_vol = flux::stored_volume(process, area, full_width, &state.to_array());

        Ok(Self {
            area,
            full_width,
            state,
            old_rates: [0.0; LAYERS],
            dry_time: 0.0,
            fluxes: Fluxes::default(),
            balance: WaterBalance::new(init_vol),
        })
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    #[must_use]
    pub fn full_width(&self) -> f64 {
        self.full_width
    }

    #[must_use]
    pub fn state(&self) -> &LayerState {
        &self.state
    }

    /// Returns the net rate of change of each layer from the last step.
    #[must_use]
    pub fn old_flux_rates(&self) -> &[f64; LAYERS] {
        &self.old_rates
    }

    /// Returns the time since the unit last received inflow (s).
    #[must_use]
    pub fn dry_time(&self) -> f64 {
        self.dry_time
    }

    /// Returns the layer flows computed in the last step.
    #[must_use]
    pub fn fluxes(&self) -> &Fluxes {
        &self.fluxes
    }

    #[must_use]
    pub fn water_balance(&self) -> &WaterBalance {
        &self.balance
    }

    /// Returns the water currently held in the unit, per unit area (ft).
    #[must_use]
    pub fn stored_volume(&self, process: &LidProcess) -> f64 {
        flux::stored_volume(process, self.area, self.full_width, &self.state.to_array())
    }

    /// Advances the unit over one step and returns the flows leaving it.
    ///
    /// The layer states are always updated, even when the iteration does not
    /// converge; the returned status says whether it did.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Forcing`] if any forcing rate is negative or
    /// non-finite.
    pub fn get_outflow(
        &mut self,
        process: &LidProcess,
        forcing: &Forcing,
        step: RoutingStep,
    ) -> Result<LidOutflow, UnitError> {
        check_rate("inflow", forcing.inflow)?;
        check_rate("evap", forcing.evap)?;
        check_rate("infil", forcing.infil)?;
        check_rate("max_infil", forcing.max_infil)?;

        let dt = step.seconds();
        if forcing.inflow > 0.0 {
            self.dry_time = 0.0;
        } else {
            self.dry_time += dt;
        }

        let infil_capacity = match process.kind() {
            LidKind::BioCell
            | LidKind::RainGarden
            | LidKind::GreenRoof
            | LidKind::VegetativeSwale => forcing.infil,
            _ => 0.0,
        };

        let ctx = FluxContext {
            process,
            area: self.area,
            full_width: self.full_width,
            inflow: forcing.inflow,
            evap_rate: forcing.evap,
            infil_capacity,
            max_native_infil: forcing.max_infil,
            clog_depth: self.balance.inflow,
            dry_time: self.dry_time,
            dt,
        };

        let config = match process.kind() {
            LidKind::VegetativeSwale => Config::trapezoidal(),
            _ => Config::euler(),
        };

        let mut fluxes = Fluxes::default();
        let solution = puls::solve(
            &self.state.to_array(),
            &self.old_rates,
            &self.bounds(process),
            dt,
            &config,
            |x| ctx.rates(x, &mut fluxes),
        );
        if !solution.status.is_converged() {
            log::warn!(
                "layer levels of LID process {} did not converge",
                process.name()
            );
        }

        let mut x = solution.state;
        if process.surface().can_overflow || self.full_width == 0.0 {
            fluxes.surface_outflow += ctx.overflow_rate(&mut x[SURF]);
        }

        self.state = LayerState::from_array(&x);
        self.old_rates = solution.rates;
        self.fluxes = fluxes;
        let stored = self.stored_volume(process);
        self.balance.record(&fluxes, dt, stored);

        Ok(LidOutflow {
            surface: fluxes.surface_outflow,
            evap: fluxes.total_evap(),
            infil: fluxes.storage_exfil,
            drain: fluxes.storage_drain,
            status: solution.status,
        })
    }

    fn bounds(&self, process: &LidProcess) -> Bounds<LAYERS> {
        let mut bounds = Bounds::non_negative(STOP_TOL);

        let soil = process.soil();
        if soil.thickness > 0.0 {
            bounds.min[SOIL] = soil.wilt_point;
            bounds.max[SOIL] = soil.porosity;
        }
        let pavement = process.pavement();
        if pavement.thickness > 0.0 {
            bounds.max[PAVE] = pavement.thickness;
        }
        let storage = process.storage();
        if storage.thickness > 0.0 {
            bounds.max[STOR] = storage.thickness;
        }
        bounds
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<(), UnitError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(UnitError::Forcing { field, value })
    }
}
