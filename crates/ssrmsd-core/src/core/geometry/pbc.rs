use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

/// Fractional separations this close to half a cell vector have two equally
/// near images.
const HALF_CELL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Periodic cell is singular or non-finite (determinant {determinant:e})")]
    SingularCell { determinant: f64 },

    #[error(
        "Ambiguous periodic image between atoms {first} and {second}: their separation is half a cell vector"
    )]
    AmbiguousImage { first: usize, second: usize },

    #[error("Atom {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// A periodic simulation cell; rows of `lattice` are the cell vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicCell {
    lattice: Matrix3<f64>,
    to_fractional: Matrix3<f64>,
}

impl PeriodicCell {
    pub fn new(lattice: Matrix3<f64>) -> Result<Self, GeometryError> {
        let determinant = lattice.determinant();
        if !determinant.is_finite() || determinant.abs() < f64::EPSILON {
            return Err(GeometryError::SingularCell { determinant });
        }
        let to_fractional = lattice
            .transpose()
            .try_inverse()
            .ok_or(GeometryError::SingularCell { determinant })?;
        Ok(Self {
            lattice,
            to_fractional,
        })
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, GeometryError> {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, b, c)))
    }

    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    /// Shortest periodic image of `separation`, or `None` when two images are
    /// equally short along some cell vector.
    ///
    /// Images are chosen by rounding fractional coordinates, which is exact for
    /// orthorhombic cells and for separations short compared with the cell.
    pub fn minimum_image(&self, separation: Vector3<f64>) -> Option<Vector3<f64>> {
        let mut fractional = self.to_fractional * separation;
        for component in fractional.iter_mut() {
            *component -= component.round();
            if component.abs() > 0.5 - HALF_CELL_TOLERANCE {
                return None;
            }
        }
        Some(self.lattice.transpose() * fractional)
    }
}

/// Rejects NaN or infinite coordinates; `atoms` supplies host indices for the error.
pub fn check_finite(positions: &[Point3<f64>], atoms: &[usize]) -> Result<(), GeometryError> {
    match positions
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        Some(i) => Err(GeometryError::NonFiniteCoordinate { index: atoms[i] }),
        None => Ok(()),
    }
}

/// Rebuilds a contiguous run of atoms so that each one sits at the minimum image
/// of its predecessor. `atoms` supplies host indices for error reporting.
pub fn make_whole(
    positions: &mut [Point3<f64>],
    atoms: &[usize],
    cell: &PeriodicCell,
) -> Result<(), GeometryError> {
    for i in 1..positions.len() {
        let separation = positions[i] - positions[i - 1];
        let image = cell
            .minimum_image(separation)
            .ok_or(GeometryError::AmbiguousImage {
                first: atoms[i - 1],
                second: atoms[i],
            })?;
        positions[i] = positions[i - 1] + image;
    }
    Ok(())
}
