use serde::Deserialize;

use super::ProcessError;

/// Ponding surface above the unit, or the channel of a swale.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceLayer {
    /// Depression storage or berm height (ft).
    pub thickness: f64,
    /// Fraction of the ponding volume not occupied by vegetation.
    pub void_frac: f64,
    /// Manning's n for overland flow.
    pub roughness: f64,
    /// Land surface slope (fraction).
    pub surf_slope: f64,
    /// Swale side slope (run over rise).
    pub side_slope: f64,
    /// Whether water above the berm leaves the unit immediately.
    pub can_overflow: bool,
}

impl Default for SurfaceLayer {
    fn default() -> Self {
        Self {
            thickness: 0.0,
            void_frac: 1.0,
            roughness: 0.0,
            surf_slope: 0.0,
            side_slope: 0.0,
            can_overflow: true,
        }
    }
}

/// Porous pavement layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PavementLayer {
    /// Layer thickness (ft).
    pub thickness: f64,
    /// Void volume over total volume.
    pub void_frac: f64,
    /// Impervious fraction of the pavement area.
    pub imperv_frac: f64,
    /// Permeability (ft/s).
    pub k_sat: f64,
    /// Cumulative inflow depth (ft) that fully clogs the pavement.
    pub clog_factor: f64,
}

/// Engineered soil layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SoilLayer {
    /// Layer thickness (ft).
    pub thickness: f64,
    pub porosity: f64,
    pub field_cap: f64,
    pub wilt_point: f64,
    /// Saturated hydraulic conductivity (ft/s).
    pub k_sat: f64,
    /// Slope of log conductivity against moisture content.
    pub k_slope: f64,
}

/// Gravel storage layer, or the tank of a rain barrel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StorageLayer {
    /// Layer thickness (ft).
    pub thickness: f64,
    pub void_frac: f64,
    /// Exfiltration rate into native soil (ft/s).
    pub k_sat: f64,
    /// Cumulative inflow depth (ft) that fully clogs the layer bottom.
    pub clog_factor: f64,
}

/// Underdrain in the storage layer.
///
/// Flow is `coeff · head^expon` with head in inches or millimeters and flow
/// in in/hr or mm/hr.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Drain {
    pub coeff: f64,
    pub expon: f64,
    /// Height of the drain above the bottom of the storage layer (ft).
    pub offset: f64,
    /// Dry time before a rain barrel starts draining (s).
    pub delay: f64,
}

/// Drainage mat beneath a green roof's soil.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DrainMat {
    /// Layer thickness (ft).
    pub thickness: f64,
    pub void_frac: f64,
    /// Manning's n for flow through the mat.
    pub roughness: f64,
}

impl SurfaceLayer {
    pub(super) fn validate(&self) -> Result<(), ProcessError> {
        non_negative("surface.thickness", self.thickness)?;
        fraction("surface.void_frac", self.void_frac)?;
        non_negative("surface.roughness", self.roughness)?;
        non_negative("surface.surf_slope", self.surf_slope)?;
        non_negative("surface.side_slope", self.side_slope)
    }
}

impl PavementLayer {
    pub(super) fn validate(&self) -> Result<(), ProcessError> {
        non_negative("pavement.thickness", self.thickness)?;
        if self.thickness > 0.0 {
            fraction("pavement.void_frac", self.void_frac)?;
            if !(0.0..1.0).contains(&self.imperv_frac) {
                return Err(ProcessError::OutOfRange {
                    field: "pavement.imperv_frac",
                    value: self.imperv_frac,
                });
            }
        }
        non_negative("pavement.k_sat", self.k_sat)?;
        non_negative("pavement.clog_factor", self.clog_factor)
    }
}

impl SoilLayer {
    pub(super) fn validate(&self) -> Result<(), ProcessError> {
        non_negative("soil.thickness", self.thickness)?;
        if self.thickness > 0.0 {
            fraction("soil.porosity", self.porosity)?;
            non_negative("soil.wilt_point", self.wilt_point)?;
            non_negative("soil.field_cap", self.field_cap)?;
            if self.wilt_point > self.field_cap || self.field_cap > self.porosity {
                return Err(ProcessError::SoilMoisture {
                    wilt_point: self.wilt_point,
                    field_cap: self.field_cap,
                    porosity: self.porosity,
                });
            }
        }
        non_negative("soil.k_sat", self.k_sat)?;
        non_negative("soil.k_slope", self.k_slope)
    }
}

impl StorageLayer {
    pub(super) fn validate(&self) -> Result<(), ProcessError> {
        non_negative("storage.thickness", self.thickness)?;
        if self.thickness > 0.0 {
            fraction("storage.void_frac", self.void_frac)?;
        }
        non_negative("storage.k_sat", self.k_sat)?;
        non_negative("storage.clog_factor", self.clog_factor)
    }
}

impl Drain {
    pub(super) fn validate(&self) -> Result<(), ProcessError> {
        non_negative("drain.coeff", self.coeff)?;
        non_negative("drain.expon", self.expon)?;
        non_negative("drain.offset", self.offset)?;
        non_negative("drain.delay", self.delay)
    }
}

impl DrainMat {
    pub(super) fn validate(&self) -> Result<(), ProcessError> {
        non_negative("drain_mat.thickness", self.thickness)?;
        if self.thickness > 0.0 {
            fraction("drain_mat.void_frac", self.void_frac)?;
        }
        non_negative("drain_mat.roughness", self.roughness)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ProcessError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProcessError::OutOfRange { field, value })
    }
}

/// Checks that a fraction lies in `(0, 1]`.
fn fraction(field: &'static str, value: f64) -> Result<(), ProcessError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ProcessError::OutOfRange { field, value })
    }
}
