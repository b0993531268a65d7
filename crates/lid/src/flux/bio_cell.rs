//! Bio-retention cells and rain gardens: surface, soil, and optional storage.

use super::{FluxContext, Fluxes, LAYERS, SOIL, STOR, SURF};

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let process = ctx.process;
    let surface = process.surface();
    let soil = process.soil();
    let storage = process.storage();
    let drain = process.drain();
    let dt = ctx.dt;

    let surface_depth = x[SURF];
    let theta = x[SOIL];
    let storage_depth = x[STOR];

    let surface_volume = surface_depth * surface.void_frac;
    let soil_volume = theta * soil.thickness;
    let storage_volume = storage_depth * storage.void_frac;

    ctx.evap_rates(
        fl,
        surface_volume,
        0.0,
        soil_volume - soil.wilt_point * soil.thickness,
        storage_volume,
        1.0,
    );
    if theta >= soil.porosity {
        fl.storage_evap = 0.0;
    }

    fl.soil_perc = ctx.limited_soil_perc(theta, fl.soil_evap);
    fl.storage_exfil = ctx.storage_exfil_rate();
    if drain.coeff > 0.0 {
        fl.storage_drain = ctx.storage_drain_rate(storage_depth, theta, 0.0, surface_depth);
    }

    if storage.thickness == 0.0 {
        // Percolation leaves through the bottom of the soil, and there is
        // no layer for an underdrain to draw from.
        fl.storage_evap = 0.0;
        fl.storage_drain = 0.0;
        let limit = fl.soil_perc.min(fl.storage_exfil);
        fl.soil_perc = limit;
        fl.storage_exfil = limit;

        let limit = (soil.porosity - theta) * soil.thickness / dt + fl.soil_perc + fl.soil_evap;
        fl.surface_infil = fl.surface_infil.min(limit);
    } else if theta >= soil.porosity && storage_depth >= storage.thickness {
        // Both layers full: the smaller capacity limits both, with
        // exfiltration taking precedence over the underdrain.
        let mut limit = fl.storage_exfil + fl.storage_drain;
        if fl.soil_perc < limit {
            limit = fl.soil_perc;
            if limit > fl.storage_exfil {
                fl.storage_drain = limit - fl.storage_exfil;
            } else {
                fl.storage_exfil = limit;
                fl.storage_drain = 0.0;
            }
        } else {
            fl.soil_perc = limit;
        }
        fl.surface_infil = fl.surface_infil.min(limit);
    } else {
        let limit = fl.soil_perc - fl.storage_evap + storage_volume / dt;
        fl.storage_exfil = fl.storage_exfil.min(limit).max(0.0);

        if fl.storage_drain > 0.0 {
            let mut limit = -fl.storage_exfil - fl.storage_evap;
            if storage_depth >= storage.thickness {
                limit += fl.soil_perc;
            }
            if drain.offset <= storage_depth {
                limit += (storage_depth - drain.offset) * storage.void_frac / dt;
            }
            fl.storage_drain = fl.storage_drain.min(limit.max(0.0));
        }

        let limit = fl.storage_exfil
            + fl.storage_drain
            + fl.storage_evap
            + (storage.thickness - storage_depth) * storage.void_frac / dt;
        fl.soil_perc = fl.soil_perc.min(limit);

        let limit = (soil.porosity - theta) * soil.thickness / dt + fl.soil_perc + fl.soil_evap;
        fl.surface_infil = fl.surface_infil.min(limit);
    }

    fl.surface_outflow = ctx.surface_outflow_rate(surface_depth);
    ctx.limit_surface_losses(fl, surface_volume);
    fl.storage_inflow = fl.soil_perc;

    let mut f = [0.0; LAYERS];
    f[SURF] = (fl.surface_inflow - fl.surface_evap - fl.surface_infil - fl.surface_outflow)
        / surface.void_frac;
    f[SOIL] = (fl.surface_infil - fl.soil_evap - fl.soil_perc) / soil.thickness;
    if storage.thickness > 0.0 {
        f[STOR] = (fl.soil_perc - fl.storage_evap - fl.storage_exfil - fl.storage_drain)
            / storage.void_frac;
    }
    f
}
