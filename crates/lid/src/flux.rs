//! Flux-rate strategies, one per LID kind.
//!
//! Every strategy maps a trial layer state to the net rate of change of each
//! layer and records the individual flows it used in a [`Fluxes`].

mod barrel;
mod bio_cell;
mod green_roof;
mod pavement;
mod roof;
mod swale;
mod trench;

use crate::{LidKind, LidProcess, MIN_FLOW};

pub(crate) const SURF: usize = 0;
pub(crate) const SOIL: usize = 1;
pub(crate) const STOR: usize = 2;
pub(crate) const PAVE: usize = 3;
pub(crate) const LAYERS: usize = 4;

const ZERO: f64 = 1.0e-10;

/// Flow rates through the layers of a unit over one step (ft/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fluxes {
    pub surface_inflow: f64,
    pub surface_infil: f64,
    pub surface_evap: f64,
    pub surface_outflow: f64,
    pub pave_evap: f64,
    pub pave_perc: f64,
    pub soil_evap: f64,
    pub soil_perc: f64,
    pub storage_inflow: f64,
    pub storage_exfil: f64,
    pub storage_evap: f64,
    pub storage_drain: f64,
}

impl Fluxes {
    /// Returns the evaporation rate summed over all layers.
    #[must_use]
    pub fn total_evap(&self) -> f64 {
        self.surface_evap + self.pave_evap + self.soil_evap + self.storage_evap
    }

    /// Returns true if no water is entering or leaving the unit.
    #[must_use]
    pub fn is_dry(&self) -> bool {
        self.surface_inflow < MIN_FLOW
            && self.surface_outflow < MIN_FLOW
            && self.storage_drain < MIN_FLOW
            && self.storage_exfil < MIN_FLOW
            && self.total_evap() < MIN_FLOW
    }
}

/// Water held in all layers at state `x`, per unit area (ft).
pub(crate) fn stored_volume(
    process: &LidProcess,
    area: f64,
    full_width: f64,
    x: &[f64; LAYERS],
) -> f64 {
    let surface = process.surface();
    if process.kind() == LidKind::VegetativeSwale {
        return swale::stored_depth(surface, area, full_width, x[SURF]);
    }
    x[SURF] * surface.void_frac
        + x[PAVE] * process.pavement().void_frac * process.perv_frac()
        + x[SOIL] * process.soil().thickness
        + x[STOR] * process.storage().void_frac
}

/// Everything a strategy needs besides the trial state.
pub(crate) struct FluxContext<'a> {
    pub process: &'a LidProcess,
    /// Area of one replicate unit (ft²).
    pub area: f64,
    /// Top width of one replicate unit (ft).
    pub full_width: f64,
    /// Inflow to the surface layer (ft/s).
    pub inflow: f64,
    /// Potential evaporation (ft/s).
    pub evap_rate: f64,
    /// Surface infiltration capacity before layer limits apply (ft/s).
    pub infil_capacity: f64,
    /// Native soil infiltration limit beneath the unit (ft/s).
    pub max_native_infil: f64,
    /// Cumulative inflow depth that drives clogging (ft).
    pub clog_depth: f64,
    /// Time since the last inflow (s).
    pub dry_time: f64,
    pub dt: f64,
}

impl FluxContext<'_> {
    /// Computes the net rate of change of each layer at trial state `x`.
    pub(crate) fn rates(&self, x: &[f64; LAYERS], fluxes: &mut Fluxes) -> [f64; LAYERS] {
        *fluxes = Fluxes {
            surface_inflow: self.inflow,
            surface_infil: self.infil_capacity,
            ..Fluxes::default()
        };

        match self.process.kind() {
            LidKind::BioCell | LidKind::RainGarden => bio_cell::rates(self, x, fluxes),
            LidKind::GreenRoof => green_roof::rates(self, x, fluxes),
            LidKind::InfiltrationTrench => trench::rates(self, x, fluxes),
            LidKind::PorousPavement => pavement::rates(self, x, fluxes),
            LidKind::RainBarrel => barrel::rates(self, x, fluxes),
            LidKind::VegetativeSwale => swale::rates(self, x, fluxes),
            LidKind::RoofDisconnection => roof::rates(self, x, fluxes),
        }
    }

    /// Removes ponded water above the surface layer's capacity.
    ///
    /// Returns the overflow rate and lowers `depth` to the capacity.
    pub(crate) fn overflow_rate(&self, depth: &mut f64) -> f64 {
        let surface = self.process.surface();
        let delta = *depth - surface.thickness;
        if delta <= 0.0 {
            return 0.0;
        }
        *depth = surface.thickness;
        delta * surface.void_frac / self.dt
    }

    /// Manning overland flow from water ponded above the berm.
    fn surface_outflow_rate(&self, depth: f64) -> f64 {
        let delta = depth - self.process.surface().thickness;
        if delta < 0.0 {
            return 0.0;
        }
        let outflow =
            self.process.surface_alpha() * delta.powf(5.0 / 3.0) * self.full_width / self.area;
        outflow.min(delta / self.dt)
    }

    /// Caps surface infiltration, then surface outflow, by the water the
    /// surface layer can supply over the step after evaporation.
    fn limit_surface_losses(&self, fluxes: &mut Fluxes, surface_volume: f64) {
        let mut available = (self.inflow + surface_volume / self.dt - fluxes.surface_evap).max(0.0);
        fluxes.surface_infil = fluxes.surface_infil.min(available);
        available -= fluxes.surface_infil;
        fluxes.surface_outflow = fluxes.surface_outflow.min(available.max(0.0));
    }

    /// Pavement permeability reduced by clogging.
    fn pavement_perm_rate(&self) -> f64 {
        let pavement = self.process.pavement();
        pavement.k_sat * (1.0 - self.clogging(pavement.clog_factor))
    }

    /// Unsaturated conductivity of the soil layer at moisture `theta`.
    fn soil_perc_rate(&self, theta: f64) -> f64 {
        let soil = self.process.soil();
        if theta <= soil.field_cap {
            return 0.0;
        }
        soil.k_sat * (-(soil.porosity - theta) * soil.k_slope).exp()
    }

    /// Soil percolation limited by the water held above field capacity.
    fn limited_soil_perc(&self, theta: f64, soil_evap: f64) -> f64 {
        let soil = self.process.soil();
        let available = ((theta - soil.field_cap) * soil.thickness).max(0.0);
        self.soil_perc_rate(theta)
            .min(available / self.dt - soil_evap)
            .max(0.0)
    }

    fn storage_exfil_rate(&self) -> f64 {
        let storage = self.process.storage();
        if storage.k_sat == 0.0 || self.max_native_infil == 0.0 {
            return 0.0;
        }
        let infil = storage.k_sat * (1.0 - self.clogging(storage.clog_factor));
        infil.min(self.max_native_infil)
    }

    /// Underdrain flow driven by the water above the drain offset.
    ///
    /// When the storage layer is full, head also includes the saturated
    /// part of the soil layer and the water in the layers above it.
    fn storage_drain_rate(
        &self,
        storage_depth: f64,
        soil_theta: f64,
        pave_depth: f64,
        surface_depth: f64,
    ) -> f64 {
        let process = self.process;
        let soil = process.soil();
        let pave_thickness = process.pavement().thickness;

        let mut head = storage_depth;
        if storage_depth >= process.storage().thickness {
            if soil.thickness > 0.0 && soil_theta > soil.field_cap && soil.porosity > soil.field_cap
            {
                head += (soil_theta - soil.field_cap) / (soil.porosity - soil.field_cap)
                    * soil.thickness;
                if soil_theta >= soil.porosity {
                    head += if pave_thickness > 0.0 {
                        pave_depth
                    } else {
                        surface_depth
                    };
                }
            }
            if pave_thickness > 0.0 {
                head += pave_depth;
                if pave_depth >= pave_thickness {
                    head += surface_depth;
                }
            }
        }
        head -= process.drain().offset;

        if head <= ZERO {
            return 0.0;
        }
        let units = process.units();
        let drain = process.drain();
        drain.coeff * (head * units.rain_depth()).powf(drain.expon) / units.rainfall()
    }

    /// Flow through a green roof's drainage mat, or all of `soil_perc` when
    /// the mat has no roughness.
    fn drain_mat_outflow(&self, depth: f64, soil_perc: f64) -> f64 {
        let alpha = self.process.drain_mat_alpha();
        if alpha > 0.0 {
            alpha * depth.powf(5.0 / 3.0) * self.full_width / self.area
                * self.process.drain_mat().void_frac
        } else {
            soil_perc
        }
    }

    /// Distributes potential evaporation from the surface downward.
    ///
    /// Volumes are per unit area (ft). Nothing evaporates below the surface
    /// while water is infiltrating into it.
    fn evap_rates(
        &self,
        fluxes: &mut Fluxes,
        surface_volume: f64,
        pave_volume: f64,
        soil_volume: f64,
        storage_volume: f64,
        perv_frac: f64,
    ) {
        let dt = self.dt;
        fluxes.surface_evap = self.evap_rate.min(surface_volume / dt).max(0.0);
        let mut available = (self.evap_rate - fluxes.surface_evap).max(0.0) * perv_frac;

        if fluxes.surface_infil > 0.0 {
            fluxes.pave_evap = 0.0;
            fluxes.soil_evap = 0.0;
            fluxes.storage_evap = 0.0;
            return;
        }

        fluxes.pave_evap = available.min(pave_volume.max(0.0) / dt);
        available = (available - fluxes.pave_evap).max(0.0);
        fluxes.soil_evap = available.min(soil_volume.max(0.0) / dt);
        available = (available - fluxes.soil_evap).max(0.0);
        fluxes.storage_evap = available.min(storage_volume.max(0.0) / dt);
    }

    /// Fraction of a conductivity lost to clogging.
    fn clogging(&self, clog_factor: f64) -> f64 {
        if clog_factor > 0.0 {
            (self.clog_depth / clog_factor).min(1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use sluice_core::UnitSystem;

    use crate::{Drain, LidDesign, StorageLayer};

    fn trench(drain: Drain) -> LidProcess {
        let design = LidDesign {
            storage: StorageLayer {
                thickness: 2.0,
                void_frac: 0.4,
                k_sat: 1.0e-5,
                clog_factor: 4.0,
            },
            drain,
            ..LidDesign::default()
        };
        LidProcess::new("trench", LidKind::InfiltrationTrench, design).unwrap()
    }

    fn context(process: &LidProcess) -> FluxContext<'_> {
        FluxContext {
            process,
            area: 100.0,
            full_width: 10.0,
            inflow: 0.0,
            evap_rate: 0.0,
            infil_capacity: 0.0,
            max_native_infil: 1.0,
            clog_depth: 0.0,
            dry_time: 0.0,
            dt: 60.0,
        }
    }

    #[test]
    fn drain_equation_uses_user_units() {
        let drain = Drain {
            coeff: 2.0,
            expon: 0.5,
            offset: 0.5,
            delay: 0.0,
        };
        let process = trench(drain);
        let ctx = context(&process);

        // One foot of head above the offset is 12 inches: 2·√12 in/hr.
        let rate = ctx.storage_drain_rate(1.5, 0.0, 0.0, 0.0);
        assert_relative_eq!(rate, 2.0 * 12.0_f64.sqrt() / 43_200.0, epsilon = 1e-15);

        let si = trench(drain).with_units(UnitSystem::Si);
        let rate = context(&si).storage_drain_rate(1.5, 0.0, 0.0, 0.0);
        assert_relative_eq!(rate, 2.0 * 304.8_f64.sqrt() / 1_097_280.0, epsilon = 1e-15);

        assert_relative_eq!(ctx.storage_drain_rate(0.4, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn clogging_reduces_exfiltration() {
        let process = trench(Drain::default());
        let mut ctx = context(&process);
        assert_relative_eq!(ctx.storage_exfil_rate(), 1.0e-5);

        ctx.clog_depth = 1.0;
        assert_relative_eq!(ctx.storage_exfil_rate(), 0.75e-5);

        ctx.clog_depth = 10.0;
        assert_relative_eq!(ctx.storage_exfil_rate(), 0.0);
    }

    #[test]
    fn native_soil_limits_exfiltration() {
        let process = trench(Drain::default());
        let mut ctx = context(&process);
        ctx.max_native_infil = 2.0e-6;

        assert_relative_eq!(ctx.storage_exfil_rate(), 2.0e-6);
    }

    #[test]
    fn evaporation_is_taken_from_the_top_down() {
        let process = trench(Drain::default());
        let mut ctx = context(&process);
        ctx.evap_rate = 1.0e-3;
        let mut fluxes = Fluxes::default();

        // 0.03 ft of ponding supplies 5e-4 ft/s over a minute.
        ctx.evap_rates(&mut fluxes, 0.03, 0.0, 0.0, 0.12, 1.0);

        assert_relative_eq!(fluxes.surface_evap, 5.0e-4);
        assert_relative_eq!(fluxes.storage_evap, 5.0e-4);

        fluxes.surface_infil = 1.0e-6;
        ctx.evap_rates(&mut fluxes, 0.03, 0.0, 0.0, 0.12, 1.0);
        assert_relative_eq!(fluxes.storage_evap, 0.0);
    }

    #[test]
    fn overflow_lowers_depth_to_capacity() {
        let process = trench(Drain::default());
        let ctx = context(&process);
        let mut depth = 0.6;

        let rate = ctx.overflow_rate(&mut depth);

        assert_relative_eq!(depth, 0.0);
        assert_relative_eq!(rate, 0.6 / 60.0);
    }

    #[test]
    fn dry_when_nothing_moves() {
        let mut fluxes = Fluxes::default();
        assert!(fluxes.is_dry());

        fluxes.storage_drain = 1.0e-6;
        assert!(!fluxes.is_dry());
    }
}
