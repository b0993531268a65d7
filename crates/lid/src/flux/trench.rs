//! Infiltration trenches: surface water drains straight into storage.

use super::{FluxContext, Fluxes, LAYERS, STOR, SURF};

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let process = ctx.process;
    let surface = process.surface();
    let storage = process.storage();
    let drain = process.drain();
    let dt = ctx.dt;

    let surface_depth = x[SURF];
    let storage_depth = x[STOR];

    let surface_volume = surface_depth * surface.void_frac;
    let storage_volume = storage_depth * storage.void_frac;

    ctx.evap_rates(fl, surface_volume, 0.0, 0.0, storage_volume, 1.0);
    if surface_depth > 0.0 {
        fl.storage_evap = 0.0;
    }

    let mut storage_inflow = (fl.surface_inflow + surface_volume / dt - fl.surface_evap).max(0.0);

    fl.storage_exfil = ctx.storage_exfil_rate();
    if drain.coeff > 0.0 {
        fl.storage_drain = ctx.storage_drain_rate(storage_depth, 0.0, 0.0, surface_depth);
    }

    let limit = storage_inflow - fl.storage_evap + storage_volume / dt;
    fl.storage_exfil = fl.storage_exfil.min(limit).max(0.0);

    if fl.storage_drain > 0.0 {
        let mut limit = -fl.storage_exfil - fl.storage_evap;
        if storage_depth >= storage.thickness {
            limit += storage_inflow;
        }
        if drain.offset <= storage_depth {
            limit += (storage_depth - drain.offset) * storage.void_frac / dt;
        }
        fl.storage_drain = fl.storage_drain.min(limit.max(0.0));
    }

    let limit = (storage.thickness - storage_depth) * storage.void_frac / dt
        + fl.storage_exfil
        + fl.storage_evap
        + fl.storage_drain;
    storage_inflow = storage_inflow.min(limit);
    fl.surface_infil = storage_inflow;

    fl.surface_outflow = ctx.surface_outflow_rate(surface_depth);
    ctx.limit_surface_losses(fl, surface_volume);
    fl.storage_inflow = fl.surface_infil;

    let mut f = [0.0; LAYERS];
    f[SURF] = (fl.surface_inflow - fl.surface_evap - fl.storage_inflow - fl.surface_outflow)
        / surface.void_frac;
    f[STOR] = (fl.storage_inflow - fl.storage_evap - fl.storage_exfil - fl.storage_drain)
        / storage.void_frac;
    f
}
