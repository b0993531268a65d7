//! Roof disconnection: roof runoff split between a downspout and overland flow.

use super::{FluxContext, Fluxes, LAYERS, SURF};

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let process = ctx.process;
    let depth = x[SURF];

    fl.surface_infil = 0.0;
    ctx.evap_rates(fl, depth, 0.0, 0.0, 0.0, 1.0);

    if process.surface_alpha() > 0.0 {
        fl.surface_outflow = ctx.surface_outflow_rate(depth);
    }

    // Downspout capacity is in user rainfall units.
    let capacity = process.drain().coeff / process.units().rainfall();
    fl.storage_drain = capacity.min(fl.surface_outflow);
    fl.surface_outflow -= fl.storage_drain;

    let mut f = [0.0; LAYERS];
    f[SURF] = fl.surface_inflow - fl.surface_evap - fl.storage_drain - fl.surface_outflow;
    f
}
