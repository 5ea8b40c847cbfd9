use super::aggregate::{self, Reduction, WindowScore};
use super::cache::NeighborListCache;
use super::config::{ColvarConfig, ConfigError};
use super::error::EngineError;
use super::output::{AtomDerivative, ColvarComponent, ColvarOutput};
use crate::core::geometry::alignment::Aligner;
use crate::core::geometry::pbc::{self, GeometryError, PeriodicCell};
use crate::core::models::chain::{ChainSegmenter, SegmentedBackbone};
use crate::core::models::template::ReferenceTemplate;
use crate::core::models::window::{self, Window};
use crate::core::switching::SwitchingFunction;
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

struct WindowOutcome {
    score: WindowScore,
    derivatives: Vec<Vector3<f64>>,
    virial: Matrix3<f64>,
    degenerate: bool,
}

/// Counts (or otherwise aggregates) backbone windows resembling a reference motif,
/// with analytic derivatives for every backbone atom.
///
/// Construction validates chains, template and configuration; evaluation only
/// fails on bad coordinates or unresolvable periodic images.
pub struct SecondaryStructureColvar {
    template: ReferenceTemplate,
    config: ColvarConfig,
    backbone: SegmentedBackbone,
    windows: Vec<Window>,
    aligner: Aligner,
    switching: SwitchingFunction,
    neighbor_list: Option<NeighborListCache>,
    degeneracy_reported: bool,
}

impl SecondaryStructureColvar {
    pub fn new(template: ReferenceTemplate, config: ColvarConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let backbone = ChainSegmenter::new(template.residue_atoms(), template.len())
            .segment(&config.chains)?;
        let windows = window::generate(&backbone, &template);
        let aligner = Aligner::new(config.alignment, &template)?;
        let switching = SwitchingFunction::new(config.switching).map_err(ConfigError::from)?;
        let neighbor_list = config.neighbor_list.map(NeighborListCache::new);

        info!(
            template = template.name(),
            chains = backbone.chains().len(),
            windows = windows.len(),
            alignment = %config.alignment,
            aggregations = ?config.aggregations.iter().map(|a| a.name()).collect::<Vec<_>>(),
            "Secondary-structure collective variable ready"
        );

        Ok(Self {
            template,
            config,
            backbone,
            windows,
            aligner,
            switching,
            neighbor_list,
            degeneracy_reported: false,
        })
    }

    pub fn template(&self) -> &ReferenceTemplate {
        &self.template
    }

    pub fn config(&self) -> &ColvarConfig {
        &self.config
    }

    pub fn backbone(&self) -> &SegmentedBackbone {
        &self.backbone
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn component_names(&self) -> Vec<&'static str> {
        self.config.aggregations.iter().map(|a| a.name()).collect()
    }

    /// Evaluates every requested aggregation for one set of host positions.
    ///
    /// `cell` is only used when periodic boundaries are enabled in the configuration.
    #[instrument(skip_all, name = "colvar_evaluate")]
    pub fn evaluate(
        &mut self,
        positions: &[Point3<f64>],
        cell: Option<&PeriodicCell>,
    ) -> Result<ColvarOutput, EngineError> {
        if let Some(max) = self.backbone.max_atom_index() {
            if max >= positions.len() {
                return Err(EngineError::AtomOutOfRange {
                    index: max,
                    available: positions.len(),
                });
            }
        }
        let cell = if self.config.pbc { cell } else { None };

        let outcomes = self.evaluate_windows(positions, cell)?;
        let scores: Vec<Option<WindowScore>> = outcomes
            .iter()
            .map(|o| o.as_ref().map(|o| o.score))
            .collect();

        let degenerate_windows = outcomes.iter().flatten().filter(|o| o.degenerate).count();
        if degenerate_windows > 0 {
            if self.degeneracy_reported {
                debug!(windows = degenerate_windows, "Degenerate windows given zero gradient");
            } else {
                warn!(
                    windows = degenerate_windows,
                    "Window distance is numerically zero; its gradient is set to zero"
                );
                self.degeneracy_reported = true;
            }
        }

        let components = self
            .config
            .aggregations
            .iter()
            .map(|aggregation| {
                let reduction = aggregate::reduce(aggregation, &scores);
                self.assemble(aggregation.name(), reduction, &outcomes)
            })
            .collect();

        if let Some(cache) = &mut self.neighbor_list {
            let switching: Vec<Option<f64>> =
                scores.iter().map(|s| s.map(|s| s.switching)).collect();
            let refreshed = cache.is_refresh_step();
            cache.complete(&switching);
            if refreshed {
                debug!(
                    active = ?cache.active_windows(),
                    evaluations = cache.evaluations(),
                    "Neighbor list refreshed"
                );
            }
        }

        let output = ColvarOutput {
            components,
            window_distances: scores.iter().map(|s| s.map(|s| s.distance)).collect(),
            degenerate_windows,
        };
        debug!(
            evaluated = output.evaluated_windows(),
            skipped = output.skipped_windows(),
            "Windows evaluated"
        );
        Ok(output)
    }

    fn evaluate_windows(
        &self,
        positions: &[Point3<f64>],
        cell: Option<&PeriodicCell>,
    ) -> Result<Vec<Option<WindowOutcome>>, GeometryError> {
        let selected: Vec<bool> = (0..self.windows.len())
            .map(|i| {
                self.neighbor_list
                    .as_ref()
                    .is_none_or(|cache| cache.should_evaluate(i))
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = self.windows.iter().zip(&selected);

        #[cfg(feature = "parallel")]
        let iterator = self.windows.par_iter().zip(&selected);

        iterator
            .map(|(window, &selected)| {
                if selected {
                    self.evaluate_window(window, positions, cell)
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    fn evaluate_window(
        &self,
        window: &Window,
        positions: &[Point3<f64>],
        cell: Option<&PeriodicCell>,
    ) -> Result<Option<WindowOutcome>, GeometryError> {
        let atoms = window.atoms(&self.backbone);
        let mut local: Vec<Point3<f64>> = atoms.iter().map(|&atom| positions[atom]).collect();
        pbc::check_finite(&local, atoms)?;
        if let Some(cell) = cell {
            pbc::make_whole(&mut local, atoms, cell)?;
        }

        if let Some(cutoff) = self.config.strands_cutoff {
            if self.strand_separation(&local) > cutoff {
                return Ok(None);
            }
        }

        let alignment = self.aligner.align(&local);
        let (switching, dswitching) = self.switching.evaluate(alignment.distance);
        Ok(Some(WindowOutcome {
            score: WindowScore {
                distance: alignment.distance,
                switching,
                dswitching,
            },
            virial: alignment.virial(&local),
            derivatives: alignment.derivatives,
            degenerate: alignment.degenerate,
        }))
    }

    /// Distance between the centroids of the first and last residue of a window.
    ///
    /// `local` must already be whole; the separation is measured as-is.
    fn strand_separation(&self, local: &[Point3<f64>]) -> f64 {
        let residue_atoms = self.backbone.residue_atoms();
        let first = mean_position(&local[..residue_atoms]);
        let last = mean_position(&local[local.len() - residue_atoms..]);
        (last - first).norm()
    }

    // Window contributions are summed per flattened slot first, then per host atom,
    // so atoms shared by overlapping windows (or listed in two chains) collect every term.
    fn assemble(
        &self,
        name: &'static str,
        reduction: Reduction,
        outcomes: &[Option<WindowOutcome>],
    ) -> ColvarComponent {
        let mut flat = vec![Vector3::zeros(); self.backbone.atom_count()];
        let mut virial = Matrix3::zeros();

        for (index, weight) in reduction.weights {
            let Some(outcome) = &outcomes[index] else {
                continue;
            };
            let window = &self.windows[index];
            for (slot, gradient) in flat[window.range()].iter_mut().zip(&outcome.derivatives) {
                *slot += gradient * weight;
            }
            virial += outcome.virial * weight;
        }

        let mut by_atom: BTreeMap<usize, Vector3<f64>> = BTreeMap::new();
        for (&atom, gradient) in self.backbone.flat_atoms().iter().zip(flat) {
            *by_atom.entry(atom).or_insert_with(Vector3::zeros) += gradient;
        }

        ColvarComponent {
            name,
            value: reduction.value,
            derivatives: by_atom
                .into_iter()
                .map(|(atom, gradient)| AtomDerivative { atom, gradient })
                .collect(),
            virial,
        }
    }
}

fn mean_position(points: &[Point3<f64>]) -> Point3<f64> {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}
