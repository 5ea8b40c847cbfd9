use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Reference template '{name}' has no coordinates")]
    Empty { name: String },

    #[error("Residue atom count must be positive")]
    ZeroResidueAtoms,

    #[error(
        "Reference template '{name}' has {atoms} atoms, which is not a multiple of {residue_atoms} atoms per residue"
    )]
    NotResidueMultiple {
        name: String,
        atoms: usize,
        residue_atoms: usize,
    },

    #[error("Reference template '{name}' has {atoms} atoms but {weights} weights")]
    WeightCountMismatch {
        name: String,
        atoms: usize,
        weights: usize,
    },

    #[error("Reference template '{name}' has invalid weights: {reason}")]
    InvalidWeights { name: String, reason: &'static str },

    #[error("Reference template '{name}' contains a non-finite coordinate at index {index}")]
    NonFiniteCoordinate { name: String, index: usize },
}

/// An immutable reference geometry that backbone windows are compared against.
///
/// A template spans `len() / residue_atoms()` residues. Alignment weights are
/// always stored normalized to unit sum; templates built without explicit weights
/// weight every atom equally.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTemplate {
    name: String,
    residue_atoms: usize,
    coordinates: Vec<Point3<f64>>,
    weights: Vec<f64>,
    bond_length: Option<f64>,
}

impl ReferenceTemplate {
    pub fn new(
        name: impl Into<String>,
        residue_atoms: usize,
        coordinates: Vec<Point3<f64>>,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        if residue_atoms == 0 {
            return Err(TemplateError::ZeroResidueAtoms);
        }
        if coordinates.is_empty() {
            return Err(TemplateError::Empty { name });
        }
        if coordinates.len() % residue_atoms != 0 {
            return Err(TemplateError::NotResidueMultiple {
                atoms: coordinates.len(),
                name,
                residue_atoms,
            });
        }
        if let Some(index) = coordinates
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(TemplateError::NonFiniteCoordinate { name, index });
        }

        let uniform = 1.0 / coordinates.len() as f64;
        Ok(Self {
            name,
            residue_atoms,
            weights: vec![uniform; coordinates.len()],
            coordinates,
            bond_length: None,
        })
    }

    /// Replaces the uniform alignment weights (e.g. with atomic masses).
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self, TemplateError> {
        if weights.len() != self.coordinates.len() {
            return Err(TemplateError::WeightCountMismatch {
                name: self.name,
                atoms: self.coordinates.len(),
                weights: weights.len(),
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(TemplateError::InvalidWeights {
                name: self.name,
                reason: "weights must be finite and non-negative",
            });
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(TemplateError::InvalidWeights {
                name: self.name,
                reason: "weights must not all be zero",
            });
        }
        self.weights = weights.into_iter().map(|w| w / total).collect();
        Ok(self)
    }

    /// Sets the separation below which reference atom pairs count as bonded.
    pub fn with_bond_length(mut self, bond_length: f64) -> Self {
        self.bond_length = Some(bond_length);
        self
    }

    /// Returns a copy with every length (coordinates and bond length) multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            name: self.name.clone(),
            residue_atoms: self.residue_atoms,
            coordinates: self
                .coordinates
                .iter()
                .map(|p| Point3::from(p.coords * factor))
                .collect(),
            weights: self.weights.clone(),
            bond_length: self.bond_length.map(|b| b * factor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn residue_atoms(&self) -> usize {
        self.residue_atoms
    }

    /// Number of reference atoms (`K`).
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Number of residues the template spans (`K / R`).
    pub fn residue_count(&self) -> usize {
        self.coordinates.len() / self.residue_atoms
    }

    pub fn coordinates(&self) -> &[Point3<f64>] {
        &self.coordinates
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bond_length(&self) -> Option<f64> {
        self.bond_length
    }
}
