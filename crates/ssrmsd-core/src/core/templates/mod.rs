//! Reference motifs: the built-in peptoid backbone set and user templates loaded
//! from TOML files.
//!
//! Registry data is stored in Ångström. Lookups convert to the caller's length
//! unit through [`LengthUnits`].

pub mod builtin;
pub mod registry;

pub use registry::{RegistryError, TemplateRegistry};

/// The length unit positions are expressed in, as nanometres per unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthUnits {
    nm_per_unit: f64,
}

impl Default for LengthUnits {
    fn default() -> Self {
        Self::nanometers()
    }
}

impl LengthUnits {
    /// Returns `None` unless `nm_per_unit` is positive and finite.
    pub fn new(nm_per_unit: f64) -> Option<Self> {
        (nm_per_unit.is_finite() && nm_per_unit > 0.0).then_some(Self { nm_per_unit })
    }

    pub fn nanometers() -> Self {
        Self { nm_per_unit: 1.0 }
    }

    pub fn angstrom() -> Self {
        Self { nm_per_unit: 0.1 }
    }

    pub fn nm_per_unit(&self) -> f64 {
        self.nm_per_unit
    }

    /// Factor converting Ångström registry data into this unit.
    pub fn from_angstrom(&self) -> f64 {
        0.1 / self.nm_per_unit
    }
}
