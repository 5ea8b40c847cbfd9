use super::config::Aggregation;

/// Distances below this are clamped before entering `β / d`.
const MIN_SOFTMIN_DISTANCE: f64 = 1e-12;

/// Per-window quantities the reductions need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WindowScore {
    pub distance: f64,
    pub switching: f64,
    pub dswitching: f64,
}

/// An aggregated value and `∂value/∂d_w` for every window that contributes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Reduction {
    pub value: f64,
    pub weights: Vec<(usize, f64)>,
}

impl Reduction {
    fn empty() -> Self {
        Self {
            value: 0.0,
            weights: Vec::new(),
        }
    }
}

/// Combines window scores; `None` marks a skipped window, which counts as a zero
/// switching value (and still counts in the mean's denominator).
pub(crate) fn reduce(aggregation: &Aggregation, scores: &[Option<WindowScore>]) -> Reduction {
    let evaluated = || {
        scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    };
    if evaluated().next().is_none() {
        return Reduction::empty();
    }

    match aggregation {
        Aggregation::LessThan => Reduction {
            value: evaluated().map(|(_, s)| s.switching).sum(),
            weights: evaluated().map(|(i, s)| (i, s.dswitching)).collect(),
        },
        Aggregation::Mean => {
            let total = scores.len() as f64;
            Reduction {
                value: evaluated().map(|(_, s)| s.switching).sum::<f64>() / total,
                weights: evaluated().map(|(i, s)| (i, s.dswitching / total)).collect(),
            }
        }
        Aggregation::Min { beta } => {
            let t: Vec<(usize, f64)> = evaluated()
                .map(|(i, s)| (i, beta / s.distance.max(MIN_SOFTMIN_DISTANCE)))
                .collect();
            let (log_sum, probabilities) = log_sum_exp(&t);
            Reduction {
                value: beta / log_sum,
                weights: t
                    .iter()
                    .zip(probabilities)
                    .map(|(&(i, ti), p)| (i, p * (ti / log_sum).powi(2)))
                    .collect(),
            }
        }
        Aggregation::AltMin { beta } => {
            let t: Vec<(usize, f64)> = evaluated().map(|(i, s)| (i, -beta * s.distance)).collect();
            let (log_sum, probabilities) = log_sum_exp(&t);
            Reduction {
                value: -log_sum / beta,
                weights: t.iter().zip(probabilities).map(|(&(i, _), p)| (i, p)).collect(),
            }
        }
        Aggregation::Lowest => extreme(evaluated(), |candidate, best| candidate < best),
        Aggregation::Highest => extreme(evaluated(), |candidate, best| candidate > best),
    }
}

/// `ln Σ exp(t_i)` and the softmax weights, shifted by the maximum for stability.
fn log_sum_exp(terms: &[(usize, f64)]) -> (f64, Vec<f64>) {
    let max = terms
        .iter()
        .map(|&(_, t)| t)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = terms.iter().map(|&(_, t)| (t - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    let probabilities = exps.into_iter().map(|e| e / sum).collect();
    (max + sum.ln(), probabilities)
}

// The first window wins ties.
fn extreme<'a>(
    mut scores: impl Iterator<Item = (usize, &'a WindowScore)>,
    better: impl Fn(f64, f64) -> bool,
) -> Reduction {
    let Some(first) = scores.next() else {
        return Reduction::empty();
    };
    let (index, best) = scores.fold((first.0, first.1.distance), |(bi, bd), (i, s)| {
        if better(s.distance, bd) { (i, s.distance) } else { (bi, bd) }
    });
    Reduction {
        value: best,
        weights: vec![(index, 1.0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::switching::{SwitchingFunction, SwitchingParams};

    fn scores_from(distances: &[f64]) -> Vec<Option<WindowScore>> {
        let switch = SwitchingFunction::new(SwitchingParams::default()).unwrap();
        distances
            .iter()
            .map(|&d| {
                let (switching, dswitching) = switch.evaluate(d);
                Some(WindowScore {
                    distance: d,
                    switching,
                    dswitching,
                })
            })
            .collect()
    }

    fn value_at(aggregation: &Aggregation, distances: &[f64]) -> f64 {
        reduce(aggregation, &scores_from(distances)).value
    }

    #[test]
    fn lessthan_sums_switching_values() {
        let scores = scores_from(&[0.0, 0.08, 2.0]);
        let reduction = reduce(&Aggregation::LessThan, &scores);
        assert!((reduction.value - (1.0 + 8.0 / 12.0)).abs() < 1e-12);
        assert_eq!(reduction.weights.len(), 3);
    }

    #[test]
    fn mean_counts_skipped_windows_in_the_denominator() {
        let mut scores = scores_from(&[0.0, 0.0]);
        scores.push(None);
        scores.push(None);
        let reduction = reduce(&Aggregation::Mean, &scores);
        assert!((reduction.value - 0.5).abs() < 1e-12);
        assert!(reduction.weights.iter().all(|&(i, _)| i < 2));
    }

    #[test]
    fn lowest_and_highest_pick_first_extreme_on_ties() {
        let scores = scores_from(&[0.3, 0.1, 0.1, 0.5, 0.5]);
        assert_eq!(reduce(&Aggregation::Lowest, &scores).weights, vec![(1, 1.0)]);
        assert_eq!(reduce(&Aggregation::Highest, &scores).weights, vec![(3, 1.0)]);
        assert_eq!(reduce(&Aggregation::Lowest, &scores).value, 0.1);
    }

    #[test]
    fn soft_minima_approach_the_smallest_distance_for_large_beta() {
        let distances = [0.4, 0.05, 0.3];
        let min = value_at(&Aggregation::Min { beta: 500.0 }, &distances);
        let alt = value_at(&Aggregation::AltMin { beta: 5000.0 }, &distances);
        assert!((min - 0.05).abs() < 1e-3, "min = {min}");
        assert!((alt - 0.05).abs() < 1e-3, "altmin = {alt}");
    }

    #[test]
    fn soft_minimum_survives_a_zero_distance() {
        let reduction = reduce(&Aggregation::Min { beta: 50.0 }, &scores_from(&[0.0, 0.2]));
        assert!(reduction.value.is_finite());
        assert!(reduction.value < 1e-9);
        assert!(reduction.weights.iter().all(|(_, w)| w.is_finite()));
    }

    #[test]
    fn weights_match_finite_difference_in_window_distances() {
        let distances = [0.05, 0.09, 0.13, 0.2];
        let h = 1e-7;
        for aggregation in [
            Aggregation::LessThan,
            Aggregation::Mean,
            Aggregation::Min { beta: 2.0 },
            Aggregation::AltMin { beta: 30.0 },
        ] {
            let reduction = reduce(&aggregation, &scores_from(&distances));
            for &(i, weight) in &reduction.weights {
                let mut up = distances;
                let mut down = distances;
                up[i] += h;
                down[i] -= h;
                let numeric = (value_at(&aggregation, &up) - value_at(&aggregation, &down)) / (2.0 * h);
                assert!(
                    (weight - numeric).abs() < 1e-5 * weight.abs().max(1.0),
                    "{}: window {i} analytic {weight} numeric {numeric}",
                    aggregation.name()
                );
            }
        }
    }

    #[test]
    fn lessthan_approaches_a_hard_count_for_steep_switching() {
        let distances = [0.02, 0.05, 0.3, 0.6];
        let errors: Vec<f64> = [(6, 12), (24, 48), (96, 192)]
            .iter()
            .map(|&(n, m)| {
                let switch = SwitchingFunction::new(SwitchingParams { r0: 0.1, d0: 0.0, n, m }).unwrap();
                let sum: f64 = distances.iter().map(|&d| switch.value(d)).sum();
                (sum - 2.0).abs()
            })
            .collect();
        assert!(errors.windows(2).all(|w| w[1] < w[0]), "errors {errors:?}");
        assert!(errors[2] < 1e-3);
    }

    #[test]
    fn reduce_of_only_skipped_windows_is_zero() {
        let reduction = reduce(&Aggregation::LessThan, &[None, None]);
        assert_eq!(reduction.value, 0.0);
        assert!(reduction.weights.is_empty());
    }
}
