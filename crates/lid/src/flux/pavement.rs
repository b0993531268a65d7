//! Porous pavement: surface, pavement, optional soil, and storage.

use super::{FluxContext, Fluxes, LAYERS, PAVE, SOIL, STOR, SURF};

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let process = ctx.process;
    let surface = process.surface();
    let pavement = process.pavement();
    let soil = process.soil();
    let storage = process.storage();
    let drain = process.drain();
    let dt = ctx.dt;

    let perv_frac = process.perv_frac();
    let pave_void = pavement.void_frac * perv_frac;
    let has_soil = process.has_soil();

    let surface_depth = x[SURF];
    let pave_depth = x[PAVE];
    let theta = x[SOIL];
    let storage_depth = x[STOR];

    let surface_volume = surface_depth * surface.void_frac;
    let pave_volume = pave_depth * pave_void;
    let soil_volume = theta * soil.thickness;
    let storage_volume = storage_depth * storage.void_frac;

    ctx.evap_rates(
        fl,
        surface_volume,
        pave_volume,
        soil_volume - soil.wilt_point * soil.thickness,
        storage_volume,
        perv_frac,
    );
    if pave_depth >= pavement.thickness || (has_soil && theta >= soil.porosity) {
        fl.storage_evap = 0.0;
    }

    // Everything on the surface can enter the pavement this step.
    fl.surface_infil = (fl.surface_inflow + surface_volume / dt - fl.surface_evap).max(0.0);

    let limit = (pave_volume / dt + fl.surface_infil - fl.pave_evap).max(0.0);
    fl.pave_perc = ctx.pavement_perm_rate().min(limit);

    fl.soil_perc = if has_soil {
        ctx.limited_soil_perc(theta, fl.soil_evap)
    } else {
        fl.pave_perc
    };

    fl.storage_exfil = ctx.storage_exfil_rate();
    if drain.coeff > 0.0 {
        fl.storage_drain = ctx.storage_drain_rate(storage_depth, theta, pave_depth, surface_depth);
    }

    let storage_full = storage_depth >= storage.thickness;
    let pave_full = pave_depth >= pavement.thickness;
    let soil_full = has_soil && theta >= soil.porosity;
    let pave_room = (pavement.thickness - pave_depth) * pave_void / dt;

    if !has_soil && storage_full && pave_full {
        let limit = fl.storage_evap + fl.storage_drain + fl.storage_exfil;
        if fl.pave_perc > limit {
            fl.pave_perc = limit;
        } else {
            fl.storage_exfil = fl.storage_exfil.min(fl.pave_perc);
            fl.storage_drain = fl.pave_perc - fl.storage_exfil;
        }
        fl.soil_perc = fl.pave_perc;
        fl.surface_infil = fl.surface_infil.min(fl.pave_perc);
    } else if storage_full && soil_full && pave_full {
        // The smallest capacity in the column limits every layer.
        let limit = (fl.storage_exfil + fl.storage_drain)
            .min(fl.soil_perc)
            .min(fl.pave_perc);
        if limit > fl.storage_exfil {
            fl.storage_drain = limit - fl.storage_exfil;
        } else {
            fl.storage_exfil = limit;
            fl.storage_drain = 0.0;
        }
        fl.soil_perc = limit;
        fl.pave_perc = limit;
        fl.surface_infil = fl.surface_infil.min(fl.pave_perc);
    } else if storage_full && soil_full {
        let limit = fl.storage_drain + fl.storage_exfil;
        if fl.soil_perc > limit {
            fl.soil_perc = limit;
        } else {
            fl.storage_exfil = fl.storage_exfil.min(fl.soil_perc);
            fl.storage_drain = fl.soil_perc - fl.storage_exfil;
        }
        fl.pave_perc = fl.pave_perc.min(fl.soil_perc + fl.soil_evap);
        let limit = pave_room + fl.pave_perc + fl.pave_evap;
        fl.surface_infil = fl.surface_infil.min(limit);
    } else if soil_full && pave_full {
        fl.soil_perc = fl.pave_perc.min(fl.soil_perc);
        limit_storage(ctx, fl, storage_depth, storage_volume);
        fl.pave_perc = fl.soil_perc;
        fl.surface_infil = fl.surface_infil.min(fl.pave_perc);
    } else {
        // Without a soil layer, soil percolation is pavement percolation.
        limit_storage(ctx, fl, storage_depth, storage_volume);
        let limit = if has_soil {
            (soil.porosity - theta) * soil.thickness / dt + fl.soil_perc
        } else {
            fl.soil_perc
        };
        fl.pave_perc = fl.pave_perc.min(limit);

        let limit = pave_room + fl.pave_perc + fl.pave_evap;
        fl.surface_infil = fl.surface_infil.min(limit);
    }

    fl.surface_outflow = ctx.surface_outflow_rate(surface_depth);
    ctx.limit_surface_losses(fl, surface_volume);

    let mut f = [0.0; LAYERS];
    f[SURF] = (fl.surface_inflow - fl.surface_evap - fl.surface_infil - fl.surface_outflow)
        / surface.void_frac;
    f[PAVE] = (fl.surface_infil - fl.pave_evap - fl.pave_perc) / pave_void;
    if has_soil {
        f[SOIL] = (fl.pave_perc - fl.soil_evap - fl.soil_perc) / soil.thickness;
        fl.storage_inflow = fl.soil_perc;
    } else {
        fl.storage_inflow = fl.pave_perc;
        fl.soil_perc = 0.0;
    }
    f[STOR] = (fl.storage_inflow - fl.storage_evap - fl.storage_exfil - fl.storage_drain)
        / storage.void_frac;
    f
}

/// Limits storage outflows by the water in storage and the inflow to it by
/// the room left, where `soil_perc` is the inflow.
fn limit_storage(ctx: &FluxContext<'_>, fl: &mut Fluxes, storage_depth: f64, storage_volume: f64) {
    let storage = ctx.process.storage();
    let drain = ctx.process.drain();
    let dt = ctx.dt;

    let limit = (fl.soil_perc - fl.storage_evap + storage_volume / dt).max(0.0);
    fl.storage_exfil = fl.storage_exfil.min(limit);

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

    let limit = ((storage.thickness - storage_depth) * storage.void_frac / dt
        + fl.storage_evap
        + fl.storage_drain
        + fl.storage_exfil)
        .max(0.0);
    fl.soil_perc = fl.soil_perc.min(limit);
}
