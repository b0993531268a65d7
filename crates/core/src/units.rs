//! Conversion factors between internal and user units.
//!
//! Internally all lengths are feet, volumes cubic feet, flows cfs, and rates
//! feet per second. User-facing values (rule premises, reports, drain
//! equations) are converted with the factors here: a user value is the
//! internal value multiplied by the factor.

use serde::Deserialize;

/// The system of units user inputs are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Inches, feet, and cubic feet.
    #[default]
    Us,
    /// Millimeters, meters, and cubic meters.
    Si,
}

impl UnitSystem {
    /// Feet of rain depth to inches (US) or millimeters (SI).
    #[must_use]
    pub fn rain_depth(self) -> f64 {
        match self {
            Self::Us => 12.0,
            Self::Si => 304.8,
        }
    }

    /// Rainfall rate in ft/s to in/hr (US) or mm/hr (SI).
    #[must_use]
    pub fn rainfall(self) -> f64 {
        match self {
            Self::Us => 43_200.0,
            Self::Si => 1_097_280.0,
        }
    }

    /// Feet to feet (US) or meters (SI).
    #[must_use]
    pub fn length(self) -> f64 {
        match self {
            Self::Us => 1.0,
            Self::Si => 0.3048,
        }
    }

    /// Cubic feet to cubic feet (US) or cubic meters (SI).
    #[must_use]
    pub fn volume(self) -> f64 {
        match self {
            Self::Us => 1.0,
            Self::Si => 0.028_317,
        }
    }
}

/// The units flow rates are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowUnits {
    #[default]
    Cfs,
    Gpm,
    Mgd,
    Cms,
    Lps,
    Mld,
}

impl FlowUnits {
    /// Cubic feet per second to these flow units.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Cfs => 1.0,
            Self::Gpm => 448.831,
            Self::Mgd => 0.646_317,
            Self::Cms => 0.028_317,
            Self::Lps => 28.317,
            Self::Mld => 2.446_6,
        }
    }

    /// Returns the unit system these flow units belong to.
    #[must_use]
    pub fn unit_system(self) -> UnitSystem {
        match self {
            Self::Cfs | Self::Gpm | Self::Mgd => UnitSystem::Us,
            Self::Cms | Self::Lps | Self::Mld => UnitSystem::Si,
        }
    }
}
