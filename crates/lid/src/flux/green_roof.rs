//! Green roofs: surface, soil, and a drainage mat acting as storage.

use super::{FluxContext, Fluxes, LAYERS, SOIL, STOR, SURF};

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let process = ctx.process;
    let surface = process.surface();
    let soil = process.soil();
    let storage = process.storage();
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
    fl.storage_drain = ctx.drain_mat_outflow(storage_depth, fl.soil_perc);

    if theta >= soil.porosity && storage_depth >= storage.thickness {
        let limit = fl.soil_perc.min(fl.storage_drain);
        fl.soil_perc = limit;
        fl.storage_drain = limit;
        fl.surface_infil = fl.surface_infil.min(limit);
    } else {
        let mut limit = storage_volume / dt - fl.storage_evap;
        if storage_depth >= storage.thickness {
            limit += fl.soil_perc;
        }
        fl.storage_drain = fl.storage_drain.min(limit.max(0.0));

        let limit = (storage.thickness - storage_depth) * storage.void_frac / dt
            + fl.storage_drain
            + fl.storage_evap;
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
    f[STOR] = (fl.soil_perc - fl.storage_evap - fl.storage_drain) / storage.void_frac;
    f
}
