use super::alignment::{AlignmentResult, DEGENERATE_DISTANCE};
use nalgebra::{Matrix3, Point3, Vector3};

/// Weighted centroid; `weights` are expected to sum to one.
pub fn centroid(points: &[Point3<f64>], weights: &[f64]) -> Point3<f64> {
    let sum = points
        .iter()
        .zip(weights)
        .fold(Vector3::zeros(), |acc, (p, w)| acc + p.coords * *w);
    Point3::from(sum)
}

fn centered(points: &[Point3<f64>], weights: &[f64]) -> Vec<Vector3<f64>> {
    let center = centroid(points, weights);
    points.iter().map(|p| p - center).collect()
}

/// Proper rotation `R` minimizing `Σ w_i |R b_i - a_i|²` for centered sets `b` (source)
/// and `a` (target).
///
/// Solved by SVD of the weighted cross-covariance `H = Σ w_i b_i a_iᵀ`. When the
/// unconstrained optimum is a reflection, the singular direction with the smallest
/// singular value is flipped so that `det(R) = +1`.
pub fn optimal_rotation(
    source: &[Vector3<f64>],
    target: &[Vector3<f64>],
    weights: &[f64],
) -> Matrix3<f64> {
    let mut covariance = Matrix3::zeros();
    for ((b, a), w) in source.iter().zip(target).zip(weights) {
        covariance += (b * a.transpose()) * *w;
    }

    let svd = covariance.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Matrix3::identity();
    };
    let v = v_t.transpose();

    let mut correction = Vector3::new(1.0, 1.0, 1.0);
    if (v * u.transpose()).determinant() < 0.0 {
        let smallest = svd.singular_values.imin();
        correction[smallest] = -1.0;
    }

    v * Matrix3::from_diagonal(&correction) * u.transpose()
}

/// RMSD after optimal rigid superposition of the reference onto `positions`.
///
/// The gradient treats the optimal rotation as fixed: at the optimum its first-order
/// variation does not change the RMSD, so `∂RMSD/∂x_i = w_i (x_i - x̂_i) / RMSD`, where
/// `x̂_i` is the superposed reference atom.
pub fn optimal(
    positions: &[Point3<f64>],
    reference: &[Vector3<f64>],
    weights: &[f64],
) -> AlignmentResult {
    let target = centered(positions, weights);
    let rotation = optimal_rotation(reference, &target, weights);

    let residuals: Vec<Vector3<f64>> = target
        .iter()
        .zip(reference)
        .map(|(a, b)| a - rotation * b)
        .collect();

    from_residuals(&residuals, weights)
}

/// RMS residual after removing the centroid of both sets, without rotation.
pub fn translational(
    positions: &[Point3<f64>],
    reference: &[Vector3<f64>],
    weights: &[f64],
) -> AlignmentResult {
    let residuals: Vec<Vector3<f64>> = centered(positions, weights)
        .iter()
        .zip(reference)
        .map(|(a, b)| a - b)
        .collect();

    from_residuals(&residuals, weights)
}

/// Centers `reference` on its weighted centroid, for use as the source set above.
pub fn center_reference(reference: &[Point3<f64>], weights: &[f64]) -> Vec<Vector3<f64>> {
    centered(reference, weights)
}

// The centroid terms of the derivative cancel because Σ w_i e_i = 0 for centered sets.
fn from_residuals(residuals: &[Vector3<f64>], weights: &[f64]) -> AlignmentResult {
    let msd: f64 = residuals
        .iter()
        .zip(weights)
        .map(|(e, w)| w * e.norm_squared())
        .sum();
    let rmsd = msd.max(0.0).sqrt();

    if rmsd < DEGENERATE_DISTANCE {
        return AlignmentResult::degenerate(rmsd, residuals.len());
    }

    let derivatives = residuals
        .iter()
        .zip(weights)
        .map(|(e, w)| e * (*w / rmsd))
        .collect();

    AlignmentResult {
        distance: rmsd,
        derivatives,
        degenerate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Unit};

    const TOLERANCE: f64 = 1e-9;

    fn reference() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.9, 1.4, 0.0),
            Point3::new(3.3, 1.7, 0.6),
            Point3::new(3.9, 2.9, -0.4),
            Point3::new(5.1, 2.6, 0.3),
        ]
    }

    fn uniform(n: usize) -> Vec<f64> {
        vec![1.0 / n as f64; n]
    }

    fn transform(points: &[Point3<f64>], rotation: &Rotation3<f64>, shift: Vector3<f64>) -> Vec<Point3<f64>> {
        points.iter().map(|p| rotation * p + shift).collect()
    }

    #[test]
    fn optimal_rotation_recovers_applied_rotation() {
        let weights = uniform(6);
        let source = center_reference(&reference(), &weights);
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::new(1.0, 2.0, -0.5)), 1.1);
        let target: Vec<Vector3<f64>> = source.iter().map(|b| rotation * b).collect();

        let recovered = optimal_rotation(&source, &target, &weights);
        assert!((recovered - rotation.matrix()).norm() < TOLERANCE);
        assert!((recovered.determinant() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn optimal_rmsd_is_zero_for_rigidly_moved_reference() {
        let weights = uniform(6);
        let source = center_reference(&reference(), &weights);
        let rotation = Rotation3::from_euler_angles(0.3, -1.2, 2.0);
        let moved = transform(&reference(), &rotation, Vector3::new(4.0, -3.0, 7.5));

        let result = optimal(&moved, &source, &weights);
        assert!(result.distance < 1e-7);
        assert!(result.degenerate);
        assert!(result.derivatives.iter().all(|g| g.norm() == 0.0));
    }

    #[test]
    fn optimal_never_returns_a_reflection_for_mirrored_input() {
        let weights = uniform(6);
        let source = center_reference(&reference(), &weights);
        let mirrored: Vec<Point3<f64>> = reference()
            .iter()
            .map(|p| Point3::new(-p.x, p.y, p.z))
            .collect();
        let target = center_reference(&mirrored, &weights);

        let rotation = optimal_rotation(&source, &target, &weights);
        assert!((rotation.determinant() - 1.0).abs() < TOLERANCE);
        assert!((rotation * rotation.transpose() - Matrix3::identity()).norm() < TOLERANCE);
    }

    #[test]
    fn optimal_handles_planar_sets_with_a_proper_rotation() {
        let planar = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let weights = uniform(4);
        let source = center_reference(&planar, &weights);
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.7);
        let moved = transform(&planar, &rotation, Vector3::new(1.0, 1.0, 1.0));
        let target = center_reference(&moved, &weights);

        let recovered = optimal_rotation(&source, &target, &weights);
        assert!((recovered.determinant() - 1.0).abs() < TOLERANCE);
        assert!(optimal(&moved, &source, &weights).distance < 1e-7);
    }

    #[test]
    fn translational_rmsd_is_zero_only_without_rotation() {
        let weights = uniform(6);
        let source = center_reference(&reference(), &weights);
        let shifted = transform(&reference(), &Rotation3::identity(), Vector3::new(-2.0, 0.5, 9.0));
        assert!(translational(&shifted, &source, &weights).distance < 1e-9);

        let rotated = transform(&reference(), &Rotation3::from_euler_angles(0.4, 0.1, -0.9), Vector3::zeros());
        assert!(translational(&rotated, &source, &weights).distance > 0.1);
    }

    #[test]
    fn translational_rmsd_matches_hand_computed_value() {
        let reference = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)];
        let weights = uniform(2);
        let source = center_reference(&reference, &weights);

        // Centered: reference ±1, positions ±2 along x, residual 1 per atom.
        let result = translational(&positions, &source, &weights);
        assert!((result.distance - 1.0).abs() < TOLERANCE);
        assert!((result.derivatives[0] - Vector3::new(-0.5, 0.0, 0.0)).norm() < TOLERANCE);
        assert!((result.derivatives[1] - Vector3::new(0.5, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn weighted_centroid_follows_weights() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)];
        let center = centroid(&points, &[0.75, 0.25]);
        assert!((center - Point3::new(1.0, 0.0, 0.0)).norm() < TOLERANCE);
    }
}
