use super::alignment::{AlignmentResult, DEGENERATE_DISTANCE};
use itertools::Itertools;
use nalgebra::{Point3, Vector3};

/// Reference separation of one atom pair taking part in the distance-matrix RMSD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePair {
    pub i: usize,
    pub j: usize,
    pub distance: f64,
}

/// The atom pairs of a reference structure and their separations.
///
/// With a `lower_bound`, pairs whose reference separation does not exceed it
/// (typically covalently bonded neighbours) are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTable {
    atoms: usize,
    pairs: Vec<ReferencePair>,
}

impl PairTable {
    pub fn new(reference: &[Point3<f64>], lower_bound: Option<f64>) -> Self {
        let pairs = (0..reference.len())
            .tuple_combinations()
            .map(|(i, j)| ReferencePair {
                i,
                j,
                distance: (reference[i] - reference[j]).norm(),
            })
            .filter(|pair| lower_bound.is_none_or(|bound| pair.distance > bound))
            .collect();

        Self {
            atoms: reference.len(),
            pairs,
        }
    }

    pub fn pairs(&self) -> &[ReferencePair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Root-mean-square difference between current and reference pair separations.
    pub fn drmsd(&self, positions: &[Point3<f64>]) -> AlignmentResult {
        let npairs = self.pairs.len() as f64;
        let deviations: Vec<(Vector3<f64>, f64, f64)> = self
            .pairs
            .iter()
            .map(|pair| {
                let separation = positions[pair.i] - positions[pair.j];
                let distance = separation.norm();
                (separation, distance, distance - pair.distance)
            })
            .collect();

        let sum_sq: f64 = deviations.iter().map(|(_, _, dev)| dev * dev).sum();
        let drmsd = (sum_sq / npairs).sqrt();

        if drmsd < DEGENERATE_DISTANCE {
            return AlignmentResult::degenerate(drmsd, self.atoms);
        }

        let mut derivatives = vec![Vector3::zeros(); self.atoms];
        let scale = 1.0 / (npairs * drmsd);
        for (pair, (separation, distance, deviation)) in self.pairs.iter().zip(&deviations) {
            if *distance == 0.0 {
                continue;
            }
            let contribution = separation * (scale * deviation / distance);
            derivatives[pair.i] += contribution;
            derivatives[pair.j] -= contribution;
        }

        AlignmentResult {
            distance: drmsd,
            derivatives,
            degenerate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, spacing: f64) -> Vec<Point3<f64>> {
        (0..n).map(|i| Point3::new(i as f64 * spacing, 0.0, 0.0)).collect()
    }

    #[test]
    fn new_includes_every_pair_without_bound() {
        let table = PairTable::new(&line(5, 1.0), None);
        assert_eq!(table.pairs().len(), 10);
        assert!(table.pairs().iter().all(|p| p.i < p.j));
    }

    #[test]
    fn new_excludes_pairs_at_or_below_lower_bound() {
        // Neighbours sit at 1.0 and are excluded; second neighbours at 2.0 survive.
        let table = PairTable::new(&line(4, 1.0), Some(1.5));
        assert_eq!(table.pairs().len(), 3);
        assert!(table.pairs().iter().all(|p| p.j - p.i >= 2));
    }

    #[test]
    fn drmsd_of_uniformly_stretched_line_matches_hand_computed_value() {
        let table = PairTable::new(&line(3, 1.0), None);
        // Pair separations 1, 1, 2 become 2, 2, 4: deviations 1, 1, 2.
        let result = table.drmsd(&line(3, 2.0));
        let expected = ((1.0 + 1.0 + 4.0) / 3.0_f64).sqrt();
        assert!((result.distance - expected).abs() < 1e-12);
        assert!(!result.degenerate);
    }

    #[test]
    fn drmsd_derivatives_sum_to_zero() {
        let reference = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.2, 0.0),
            Point3::new(1.4, 1.3, 0.5),
            Point3::new(0.2, 1.9, -0.3),
        ];
        let current = vec![
            Point3::new(0.1, 0.0, 0.0),
            Point3::new(1.3, 0.1, 0.2),
            Point3::new(1.0, 1.5, 0.1),
            Point3::new(0.0, 2.2, -0.6),
        ];
        let result = PairTable::new(&reference, None).drmsd(&current);
        let total: Vector3<f64> = result.derivatives.iter().sum();
        assert!(total.norm() < 1e-12);
    }

    #[test]
    fn drmsd_of_reference_is_degenerate_with_zero_gradient() {
        let reference = line(4, 1.3);
        let result = PairTable::new(&reference, None).drmsd(&reference);
        assert_eq!(result.distance, 0.0);
        assert!(result.degenerate);
        assert_eq!(result.derivatives.len(), 4);
    }
}
