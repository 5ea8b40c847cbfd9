use crate::cli::EvaluateArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use ssrmsd::core::geometry::alignment::AlignmentMode;
use ssrmsd::core::switching::SwitchingParams;
use ssrmsd::core::templates::LengthUnits;
use ssrmsd::engine::config::{self as core_config, AggregationSpec};
use ssrmsd::workflows::evaluate::EvaluateConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A backbone chain given either atom by atom or as an inclusive index range.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum PartialChain {
    Atoms(Vec<usize>),
    Range { first: usize, last: usize },
}

impl PartialChain {
    fn into_atoms(self, chain: usize) -> Result<Vec<usize>> {
        match self {
            PartialChain::Atoms(atoms) => Ok(atoms),
            PartialChain::Range { first, last } if first <= last => Ok((first..=last).collect()),
            PartialChain::Range { first, last } => Err(CliError::Config(format!(
                "Chain {} has an empty range: first = {} > last = {}",
                chain, first, last
            ))),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialSwitchingConfig {
    r0: Option<f64>,
    d0: Option<f64>,
    n: Option<u32>,
    m: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialNeighborListConfig {
    stride: u64,
    tolerance: f64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialEvaluateConfig {
    template: Option<String>,
    template_file: Option<PathBuf>,
    /// Nanometres per length unit of the trajectory coordinates.
    length_unit: Option<f64>,
    exclude_bonded_pairs: Option<bool>,
    chains: Option<Vec<PartialChain>>,
    alignment: Option<String>,
    lower_bound: Option<f64>,
    switching: Option<PartialSwitchingConfig>,
    aggregations: Option<Vec<AggregationSpec>>,
    strands_cutoff: Option<f64>,
    pbc: Option<bool>,
    neighbor_list: Option<PartialNeighborListConfig>,

    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialEvaluateConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn merge_with_cli(self, args: &EvaluateArgs) -> Result<EvaluateConfig> {
        let template = args.template.clone().or(self.template).ok_or_else(|| {
            CliError::Config(
                "A value for 'template' is required either in the config file or via --template."
                    .to_string(),
            )
        })?;

        // File paths in the config are relative to the config file; CLI paths to the
        // working directory.
        let template_file = match (&args.template_file, self.template_file) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(path)) if path.is_relative() => Some(match &self.base_dir {
                Some(dir) => dir.join(path),
                None => path,
            }),
            (None, other) => other,
        };

        let units = match self.length_unit {
            Some(nm) => LengthUnits::new(nm).ok_or_else(|| {
                CliError::Config(format!(
                    "`length-unit` must be a positive number of nanometres (got {})",
                    nm
                ))
            })?,
            None => LengthUnits::nanometers(),
        };

        let chains = self
            .chains
            .ok_or_else(|| CliError::Config("`chains` is required.".to_string()))?
            .into_iter()
            .enumerate()
            .map(|(i, chain)| chain.into_atoms(i))
            .collect::<Result<Vec<_>>>()?;

        let alignment = Self::merge_alignment(
            args.alignment,
            self.alignment.as_deref(),
            self.lower_bound,
        )?;
        let switching = Self::merge_switching(args.r0, self.switching.unwrap_or_default());

        let aggregations = self
            .aggregations
            .unwrap_or_default()
            .iter()
            .map(AggregationSpec::resolve)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut builder = core_config::ColvarConfigBuilder::new()
            .chains(chains)
            .alignment(alignment)
            .switching(switching)
            .aggregations(aggregations)
            .pbc(!args.no_pbc && self.pbc.unwrap_or(true));
        if let Some(cutoff) = self.strands_cutoff {
            builder = builder.strands_cutoff(cutoff);
        }
        if let Some(nl) = self.neighbor_list {
            builder = builder.neighbor_list(nl.stride, nl.tolerance);
        }
        let colvar = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        Ok(EvaluateConfig {
            template,
            template_file,
            units,
            exclude_bonded_pairs: self.exclude_bonded_pairs.unwrap_or(true),
            colvar,
        })
    }

    fn merge_alignment(
        cli_mode: Option<AlignmentMode>,
        file_mode: Option<&str>,
        lower_bound: Option<f64>,
    ) -> Result<AlignmentMode> {
        let mode = match (cli_mode, file_mode) {
            (Some(mode), _) => mode,
            (None, Some(name)) => name
                .parse::<AlignmentMode>()
                .map_err(|e| CliError::Config(e.to_string()))?,
            (None, None) => AlignmentMode::default(),
        };

        match (mode, lower_bound) {
            (AlignmentMode::DistanceMatrix { .. }, Some(bound)) => {
                if !(bound.is_finite() && bound >= 0.0) {
                    return Err(CliError::Config(format!(
                        "`lower-bound` must be finite and non-negative (got {})",
                        bound
                    )));
                }
                Ok(AlignmentMode::DistanceMatrix {
                    lower_bound: Some(bound),
                })
            }
            (mode, Some(_)) => Err(CliError::Config(format!(
                "`lower-bound` only applies to 'drmsd' alignment, not '{}'",
                mode
            ))),
            (mode, None) => Ok(mode),
        }
    }

    fn merge_switching(cli_r0: Option<f64>, partial: PartialSwitchingConfig) -> SwitchingParams {
        let defaults = SwitchingParams::default();
        SwitchingParams {
            r0: cli_r0.or(partial.r0).unwrap_or(defaults.r0),
            d0: partial.d0.unwrap_or(defaults.d0),
            n: partial.n.unwrap_or(defaults.n),
            m: partial.m.unwrap_or(defaults.m),
        }
    }
}
