//! Rain barrels: a storage tank that drains once the weather turns dry.

use super::{FluxContext, Fluxes, LAYERS, STOR, SURF};

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let process = ctx.process;
    let drain = process.drain();
    let storage_depth = x[STOR];

    fl.surface_infil = 0.0;

    if drain.delay == 0.0 || ctx.dry_time >= drain.delay {
        let head = storage_depth - drain.offset;
        if head > 0.0 {
            fl.storage_drain = ctx
                .storage_drain_rate(storage_depth, 0.0, 0.0, 0.0)
                .min(head / ctx.dt);
        }
    }

    let room = (process.storage().thickness - storage_depth) / ctx.dt + fl.storage_drain;
    fl.storage_inflow = fl.surface_inflow.min(room);
    fl.surface_infil = fl.storage_inflow;

    let mut f = [0.0; LAYERS];
    f[SURF] = fl.surface_inflow - fl.storage_inflow;
    f[STOR] = fl.storage_inflow - fl.storage_drain;
    f
}
