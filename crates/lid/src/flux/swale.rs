//! Vegetative swales: a trapezoidal channel with Manning outflow.
//!
//! Flows are computed in cfs over the whole swale and converted to rates
//! per unit area at the end.

use crate::SurfaceLayer;

use super::{FluxContext, Fluxes, LAYERS, SURF, ZERO};

/// Narrowest channel width considered (ft).
const MIN_WIDTH: f64 = 0.5;

/// Cross-section and length of a swale placed over a given area.
struct Channel {
    bottom_width: f64,
    side_slope: f64,
    length: f64,
}

impl Channel {
    fn new(surface: &SurfaceLayer, area: f64, full_width: f64) -> Self {
        let full_depth = surface.thickness;
        let top_width = full_width.max(MIN_WIDTH);

        let mut side_slope = surface.side_slope;
        let mut bottom_width = top_width - 2.0 * side_slope * full_depth;
        if bottom_width < MIN_WIDTH {
            bottom_width = MIN_WIDTH;
            side_slope = 0.5 * (top_width - MIN_WIDTH) / full_depth;
        }

        Self {
            bottom_width,
            side_slope,
            length: area / top_width,
        }
    }

    fn surface_area(&self, depth: f64) -> f64 {
        self.length * (self.bottom_width + 2.0 * self.side_slope * depth)
    }

    fn flow_area(&self, depth: f64, void_frac: f64) -> f64 {
        depth * (self.bottom_width + self.side_slope * depth) * void_frac
    }
}

/// Water held in a swale at `depth`, per unit area (ft).
pub(super) fn stored_depth(surface: &SurfaceLayer, area: f64, full_width: f64, depth: f64) -> f64 {
    let channel = Channel::new(surface, area, full_width);
    let depth = depth.min(surface.thickness);
    channel.length * channel.flow_area(depth, surface.void_frac) / area
}

pub(super) fn rates(ctx: &FluxContext<'_>, x: &[f64; LAYERS], fl: &mut Fluxes) -> [f64; LAYERS] {
    let surface = ctx.process.surface();
    let full_depth = surface.thickness;
    let depth = x[SURF].min(full_depth);
    let area = ctx.area;

    let channel = Channel::new(surface, area, ctx.full_width);
    let surface_area = channel.surface_area(depth);
    let flow_area = channel.flow_area(depth, surface.void_frac);
    let volume = channel.length * flow_area;

    let inflow = fl.surface_inflow * area;
    let evap = (ctx.evap_rate * surface_area).min(volume / ctx.dt);
    // Infiltration cannot take more than the swale holds and receives.
    let exfil = (fl.surface_infil * surface_area).min((inflow + volume / ctx.dt - evap).max(0.0));

    let mut outflow = 0.0;
    if depth > ZERO && flow_area > ZERO {
        let wetted_perimeter = channel.bottom_width
            + 2.0 * depth * (1.0 + channel.side_slope * channel.side_slope).sqrt();
        let hyd_radius = flow_area / wetted_perimeter;
        outflow = ctx.process.surface_alpha() * flow_area * hyd_radius.powf(2.0 / 3.0);
    }

    let mut net = inflow - evap - exfil - outflow;
    if depth == full_depth && net > 0.0 {
        // A full swale spills any net gain.
        outflow += net;
        net = 0.0;
    }

    fl.surface_evap = evap / area;
    fl.surface_infil = exfil / area;
    fl.storage_exfil = exfil / area;
    fl.surface_outflow = outflow / area;

    let mut f = [0.0; LAYERS];
    f[SURF] = net / surface_area;
    f
}
