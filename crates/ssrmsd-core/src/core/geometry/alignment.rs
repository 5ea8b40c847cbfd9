use super::drmsd::PairTable;
use super::superposition;
use crate::core::models::template::ReferenceTemplate;
use nalgebra::{Matrix3, Point3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Distances below this are treated as an exact match: the gradient direction is
/// undefined there, so a zero gradient is reported instead.
pub const DEGENERATE_DISTANCE: f64 = 1e-9;

/// How a window is compared with the reference structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentMode {
    /// Optimal rigid superposition (rotation and translation).
    Optimal,
    /// Centroid removal only; no rotation.
    Translational,
    /// RMS difference of interatomic distances. Pairs whose reference separation does
    /// not exceed `lower_bound` are ignored.
    DistanceMatrix { lower_bound: Option<f64> },
}

impl Default for AlignmentMode {
    fn default() -> Self {
        AlignmentMode::DistanceMatrix { lower_bound: None }
    }
}

impl AlignmentMode {
    pub fn name(&self) -> &'static str {
        match self {
            AlignmentMode::Optimal => "optimal",
            AlignmentMode::Translational => "simple",
            AlignmentMode::DistanceMatrix { .. } => "drmsd",
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown alignment mode '{0}'. Expected 'optimal', 'simple' or 'drmsd'.")]
pub struct ParseAlignmentModeError(pub String);

impl FromStr for AlignmentMode {
    type Err = ParseAlignmentModeError;

    /// Parses the alignment names used in input files (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimal" => Ok(AlignmentMode::Optimal),
            "simple" | "translational" | "translation-only" => Ok(AlignmentMode::Translational),
            "drmsd" | "distance-matrix" => Ok(AlignmentMode::DistanceMatrix { lower_bound: None }),
            _ => Err(ParseAlignmentModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error(
        "No reference atom pairs are separated by more than {lower_bound}; the distance-matrix RMSD would be undefined"
    )]
    NoPairs { lower_bound: f64 },

    #[error("Distance-matrix lower bound must be finite and non-negative (got {0})")]
    InvalidLowerBound(f64),
}

/// Distance of one window from the reference and its gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub distance: f64,
    /// `∂distance/∂x_i`, one entry per window atom.
    pub derivatives: Vec<Vector3<f64>>,
    /// Set when the distance was too small for a meaningful gradient and
    /// `derivatives` were zeroed.
    pub degenerate: bool,
}

impl AlignmentResult {
    pub(crate) fn degenerate(distance: f64, atoms: usize) -> Self {
        Self {
            distance,
            derivatives: vec![Vector3::zeros(); atoms],
            degenerate: true,
        }
    }

    /// Virial-like tensor `-Σ_i x_i ⊗ ∂d/∂x_i` for the positions that were aligned.
    pub fn virial(&self, positions: &[Point3<f64>]) -> Matrix3<f64> {
        positions
            .iter()
            .zip(&self.derivatives)
            .fold(Matrix3::zeros(), |acc, (x, g)| acc - x.coords * g.transpose())
    }
}

/// A reference structure prepared for one alignment mode.
///
/// Aligners hold no per-evaluation state and can be shared between threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Aligner {
    Optimal {
        reference: Vec<Vector3<f64>>,
        weights: Vec<f64>,
    },
    Translational {
        reference: Vec<Vector3<f64>>,
        weights: Vec<f64>,
    },
    DistanceMatrix {
        pairs: PairTable,
    },
}

impl Aligner {
    pub fn new(mode: AlignmentMode, template: &ReferenceTemplate) -> Result<Self, AlignmentError> {
        let weights = template.weights().to_vec();
        match mode {
            AlignmentMode::Optimal => Ok(Aligner::Optimal {
                reference: superposition::center_reference(template.coordinates(), &weights),
                weights,
            }),
            AlignmentMode::Translational => Ok(Aligner::Translational {
                reference: superposition::center_reference(template.coordinates(), &weights),
                weights,
            }),
            AlignmentMode::DistanceMatrix { lower_bound } => {
                if let Some(bound) = lower_bound {
                    if !bound.is_finite() || bound < 0.0 {
                        return Err(AlignmentError::InvalidLowerBound(bound));
                    }
                }
                let pairs = PairTable::new(template.coordinates(), lower_bound);
                if pairs.is_empty() {
                    return Err(AlignmentError::NoPairs {
                        lower_bound: lower_bound.unwrap_or(0.0),
                    });
                }
                Ok(Aligner::DistanceMatrix { pairs })
            }
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            Aligner::Optimal { .. } => "optimal",
            Aligner::Translational { .. } => "simple",
            Aligner::DistanceMatrix { .. } => "drmsd",
        }
    }

    /// Compares one window, given as positions in template order.
    pub fn align(&self, positions: &[Point3<f64>]) -> AlignmentResult {
        match self {
            Aligner::Optimal { reference, weights } => {
                superposition::optimal(positions, reference, weights)
            }
            Aligner::Translational { reference, weights } => {
                superposition::translational(positions, reference, weights)
            }
            Aligner::DistanceMatrix { pairs } => pairs.drmsd(positions),
        }
    }
}
