//! Generic LID designs.
//!
//! Layer parameters are per unit of area and in internal units: lengths in
//! feet and conductivities in feet per second. The underdrain coefficient
//! and exponent are the exception; the drain equation is evaluated in user
//! units (in/hr or mm/hr of flow per in or mm of head), selected by
//! [`LidProcess::with_units`].

mod layers;

use serde::Deserialize;
use sluice_core::UnitSystem;
use thiserror::Error;

pub use layers::{Drain, DrainMat, PavementLayer, SoilLayer, StorageLayer, SurfaceLayer};

/// The kinds of LID practice, each with its own layer topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LidKind {
    BioCell,
    RainGarden,
    GreenRoof,
    InfiltrationTrench,
    PorousPavement,
    RainBarrel,
    VegetativeSwale,
    RoofDisconnection,
}

impl LidKind {
    fn requires_soil(self) -> bool {
        matches!(self, Self::BioCell | Self::RainGarden | Self::GreenRoof)
    }

    fn uses_soil(self) -> bool {
        self.requires_soil() || self == Self::PorousPavement
    }

    fn requires_storage(self) -> bool {
        matches!(
            self,
            Self::InfiltrationTrench | Self::PorousPavement | Self::RainBarrel
        )
    }
}

/// The layer parameters of an LID design, as read from input.
///
/// Layers a kind does not use are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct LidDesign {
    pub surface: SurfaceLayer,
    pub pavement: PavementLayer,
    pub soil: SoilLayer,
    pub storage: StorageLayer,
    pub drain: Drain,
    pub drain_mat: DrainMat,
}

/// Errors raised while validating an LID design.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProcessError {
    #[error("{kind:?} requires a {layer} layer with positive thickness")]
    MissingLayer { kind: LidKind, layer: &'static str },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error(
        "soil moisture limits must satisfy wilting point {wilt_point} <= \
         field capacity {field_cap} <= porosity {porosity}"
    )]
    SoilMoisture {
        wilt_point: f64,
        field_cap: f64,
        porosity: f64,
    },
}

/// A validated LID design shared by every unit that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct LidProcess {
    name: String,
    kind: LidKind,
    surface: SurfaceLayer,
    pavement: PavementLayer,
    soil: SoilLayer,
    storage: StorageLayer,
    drain: Drain,
    drain_mat: DrainMat,
    surface_alpha: f64,
    drain_mat_alpha: f64,
    units: UnitSystem,
}

impl LidProcess {
    /// Validates a design and derives its Manning coefficients.
    ///
    /// Some kinds normalize their layers: a green roof's drainage mat acts
    /// as its storage layer, a rain garden keeps only the storage layer's
    /// seepage parameters, a rain barrel's excess spills immediately, and a
    /// roof surface has no vegetation volume.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] if a required layer is missing, a value is
    /// negative, non-finite, or out of its fractional range, or the soil
    /// moisture limits are inconsistent.
    pub fn new(
        name: impl Into<String>,
        kind: LidKind,
        design: LidDesign,
    ) -> Result<Self, ProcessError> {
        let LidDesign {
            mut surface,
            mut pavement,
            mut soil,
            mut storage,
            drain,
            drain_mat,
        } = design;

        surface.validate()?;
        pavement.validate()?;
        soil.validate()?;
        storage.validate()?;
        drain.validate()?;
        drain_mat.validate()?;

        if kind.requires_soil() && soil.thickness <= 0.0 {
            return Err(ProcessError::MissingLayer { kind, layer: "soil" });
        }
        if kind.requires_storage() && storage.thickness <= 0.0 {
            return Err(ProcessError::MissingLayer {
                kind,
                layer: "storage",
            });
        }

        match kind {
            LidKind::PorousPavement if pavement.thickness <= 0.0 => {
                return Err(ProcessError::MissingLayer {
                    kind,
                    layer: "pavement",
                });
            }
            LidKind::GreenRoof => {
                if drain_mat.thickness <= 0.0 {
                    return Err(ProcessError::MissingLayer {
                        kind,
                        layer: "drainage mat",
                    });
                }
                storage = StorageLayer {
                    thickness: drain_mat.thickness,
                    void_frac: drain_mat.void_frac,
                    k_sat: 0.0,
                    clog_factor: 0.0,
                };
            }
            LidKind::RainGarden => {
                // Only the seepage rate into native soil applies.
                storage = StorageLayer {
                    thickness: 0.0,
                    void_frac: 0.0,
                    ..storage
                };
            }
            LidKind::RainBarrel => {
                storage.void_frac = 1.0;
                surface = SurfaceLayer {
                    thickness: 0.0,
                    void_frac: 1.0,
                    can_overflow: true,
                    ..surface
                };
            }
            LidKind::RoofDisconnection => {
                // Roof ponding is not reduced by vegetation.
                surface.void_frac = 1.0;
            }
            LidKind::VegetativeSwale => {
                if surface.thickness <= 0.0 {
                    return Err(ProcessError::MissingLayer {
                        kind,
                        layer: "surface",
                    });
                }
                check_positive("surface.roughness", surface.roughness)?;
                check_positive("surface.surf_slope", surface.surf_slope)?;
            }
            _ => {}
        }

        if !kind.uses_soil() {
            soil = SoilLayer::default();
        }
        if kind != LidKind::PorousPavement {
            pavement = PavementLayer::default();
        }
        if matches!(kind, LidKind::VegetativeSwale | LidKind::RoofDisconnection) {
            storage = StorageLayer::default();
        }

        let surface_alpha = manning_alpha(surface.surf_slope, surface.roughness);
        let drain_mat_alpha = manning_alpha(surface.surf_slope, drain_mat.roughness);

        Ok(Self {
            name: name.into(),
            kind,
            surface,
            pavement,
            soil,
            storage,
            drain,
            drain_mat,
            surface_alpha,
            drain_mat_alpha,
            units: UnitSystem::default(),
        })
    }

    /// Sets the unit system the underdrain equation is expressed in.
    #[must_use]
    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> LidKind {
        self.kind
    }

    #[must_use]
    pub fn surface(&self) -> &SurfaceLayer {
        &self.surface
    }

    #[must_use]
    pub fn pavement(&self) -> &PavementLayer {
        &self.pavement
    }

    #[must_use]
    pub fn soil(&self) -> &SoilLayer {
        &self.soil
    }

    #[must_use]
    pub fn storage(&self) -> &StorageLayer {
        &self.storage
    }

    #[must_use]
    pub fn drain(&self) -> &Drain {
        &self.drain
    }

    #[must_use]
    pub fn drain_mat(&self) -> &DrainMat {
        &self.drain_mat
    }

    /// Returns `1.49 √S / n` for overland flow across the surface layer.
    #[must_use]
    pub fn surface_alpha(&self) -> f64 {
        self.surface_alpha
    }

    /// Returns `1.49 √S / n` for flow through a green roof's drainage mat.
    #[must_use]
    pub fn drain_mat_alpha(&self) -> f64 {
        self.drain_mat_alpha
    }

    #[must_use]
    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// Returns the fraction of the pavement layer's area that is pervious.
    pub(crate) fn perv_frac(&self) -> f64 {
        1.0 - self.pavement.imperv_frac
    }

    pub(crate) fn has_soil(&self) -> bool {
        self.soil.thickness > 0.0
    }
}

fn manning_alpha(slope: f64, roughness: f64) -> f64 {
    if roughness > 0.0 {
        1.49 * slope.sqrt() / roughness
    } else {
        0.0
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ProcessError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProcessError::OutOfRange { field, value })
    }
}
