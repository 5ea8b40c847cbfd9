use crate::core::geometry::alignment::AlignmentMode;
use crate::core::switching::{SwitchingError, SwitchingParams};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Aggregation '{aggregation}' requires the '{parameter}' parameter")]
    MissingAggregationParameter {
        aggregation: &'static str,
        parameter: &'static str,
    },

    #[error("Aggregation '{aggregation}' is requested more than once")]
    DuplicateAggregation { aggregation: &'static str },

    #[error(
        "Aggregation '{aggregation}' cannot be combined with {feature}, which skips windows"
    )]
    IncompatibleAggregation {
        aggregation: &'static str,
        feature: &'static str,
    },

    #[error(transparent)]
    Switching(#[from] SwitchingError),
}

/// How per-window results are combined into one output value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// Sum of switching values: the number of windows closer than `r0`.
    LessThan,
    /// Sum of switching values divided by the total number of windows.
    Mean,
    /// Soft minimum of distances, `β / ln Σ exp(β / d)`.
    Min { beta: f64 },
    /// Soft minimum of distances, `-ln Σ exp(-β d) / β`.
    AltMin { beta: f64 },
    /// Smallest distance.
    Lowest,
    /// Largest distance.
    Highest,
}

impl Aggregation {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::LessThan => "lessthan",
            Aggregation::Mean => "mean",
            Aggregation::Min { .. } => "min",
            Aggregation::AltMin { .. } => "altmin",
            Aggregation::Lowest => "lowest",
            Aggregation::Highest => "highest",
        }
    }

    /// Whether a skipped window can stand in for a zero switching value.
    pub fn tolerates_skipped_windows(&self) -> bool {
        matches!(self, Aggregation::LessThan | Aggregation::Mean)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Aggregation::Min { beta } | Aggregation::AltMin { beta }
                if !(beta.is_finite() && *beta > 0.0) =>
            {
                Err(ConfigError::InvalidValue {
                    parameter: "beta",
                    reason: format!("must be positive and finite (got {beta})"),
                })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    #[serde(alias = "less-than", alias = "sum")]
    LessThan,
    #[serde(alias = "average")]
    Mean,
    Min,
    #[serde(alias = "alt-min")]
    AltMin,
    Lowest,
    Highest,
}

/// Serialized form of an [`Aggregation`]; parameters are checked by [`AggregationSpec::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationSpec {
    pub kind: AggregationKind,
    #[serde(default)]
    pub beta: Option<f64>,
}

impl AggregationSpec {
    pub fn resolve(&self) -> Result<Aggregation, ConfigError> {
        let beta = |aggregation| {
            self.beta.ok_or(ConfigError::MissingAggregationParameter {
                aggregation,
                parameter: "beta",
            })
        };
        Ok(match self.kind {
            AggregationKind::LessThan => Aggregation::LessThan,
            AggregationKind::Mean => Aggregation::Mean,
            AggregationKind::Min => Aggregation::Min { beta: beta("min")? },
            AggregationKind::AltMin => Aggregation::AltMin {
                beta: beta("altmin")?,
            },
            AggregationKind::Lowest => Aggregation::Lowest,
            AggregationKind::Highest => Aggregation::Highest,
        })
    }
}

/// Periodic refresh of the set of windows worth evaluating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborListConfig {
    /// Every `stride`-th evaluation recomputes every window.
    pub stride: u64,
    /// Windows whose switching value fell below this at the last refresh are skipped.
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColvarConfig {
    /// Host atom indices of each backbone chain, in declaration order.
    pub chains: Vec<Vec<usize>>,
    pub alignment: AlignmentMode,
    pub switching: SwitchingParams,
    pub aggregations: Vec<Aggregation>,
    pub strands_cutoff: Option<f64>,
    /// Make windows whole with the minimum-image convention when a cell is supplied.
    pub pbc: bool,
    pub neighbor_list: Option<NeighborListConfig>,
}

#[derive(Default)]
pub struct ColvarConfigBuilder {
    chains: Option<Vec<Vec<usize>>>,
    alignment: Option<AlignmentMode>,
    switching: Option<SwitchingParams>,
    aggregations: Vec<Aggregation>,
    strands_cutoff: Option<f64>,
    pbc: Option<bool>,
    neighbor_list: Option<NeighborListConfig>,
}

impl ColvarConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chains(mut self, chains: Vec<Vec<usize>>) -> Self {
        self.chains = Some(chains);
        self
    }
    pub fn chain(mut self, atoms: Vec<usize>) -> Self {
        self.chains.get_or_insert_with(Vec::new).push(atoms);
        self
    }
    pub fn alignment(mut self, mode: AlignmentMode) -> Self {
        self.alignment = Some(mode);
        self
    }
    pub fn switching(mut self, params: SwitchingParams) -> Self {
        self.switching = Some(params);
        self
    }
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }
    pub fn aggregations(mut self, aggregations: Vec<Aggregation>) -> Self {
        self.aggregations = aggregations;
        self
    }
    pub fn strands_cutoff(mut self, cutoff: f64) -> Self {
        self.strands_cutoff = Some(cutoff);
        self
    }
    pub fn pbc(mut self, enabled: bool) -> Self {
        self.pbc = Some(enabled);
        self
    }
    pub fn neighbor_list(mut self, stride: u64, tolerance: f64) -> Self {
        self.neighbor_list = Some(NeighborListConfig { stride, tolerance });
        self
    }

    /// Validates the settings. An empty aggregation list means `lessthan` alone.
    pub fn build(self) -> Result<ColvarConfig, ConfigError> {
        let aggregations = if self.aggregations.is_empty() {
            vec![Aggregation::LessThan]
        } else {
            self.aggregations
        };
        let config = ColvarConfig {
            chains: self.chains.ok_or(ConfigError::MissingParameter("chains"))?,
            alignment: self.alignment.unwrap_or_default(),
            switching: self.switching.unwrap_or_default(),
            aggregations,
            strands_cutoff: self.strands_cutoff,
            pbc: self.pbc.unwrap_or(true),
            neighbor_list: self.neighbor_list,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ColvarConfig {
    /// Checks parameter ranges and that skipping windows is only combined with
    /// aggregations that tolerate it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.switching.validate()?;

        if self.aggregations.is_empty() {
            return Err(ConfigError::MissingParameter("aggregations"));
        }
        for (i, aggregation) in self.aggregations.iter().enumerate() {
            aggregation.validate()?;
            if self.aggregations[..i]
                .iter()
                .any(|a| a.name() == aggregation.name())
            {
                return Err(ConfigError::DuplicateAggregation {
                    aggregation: aggregation.name(),
                });
            }
        }

        if let Some(cutoff) = self.strands_cutoff {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(ConfigError::InvalidValue {
                    parameter: "strands_cutoff",
                    reason: format!("must be positive and finite (got {cutoff})"),
                });
            }
            reject_intolerant(&self.aggregations, "a strands cutoff")?;
        }

        if let Some(nl) = &self.neighbor_list {
            if nl.stride == 0 {
                return Err(ConfigError::InvalidValue {
                    parameter: "neighbor_list.stride",
                    reason: "must be at least 1".to_string(),
                });
            }
            if !(nl.tolerance.is_finite() && nl.tolerance >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    parameter: "neighbor_list.tolerance",
                    reason: format!("must be finite and non-negative (got {})", nl.tolerance),
                });
            }
            reject_intolerant(&self.aggregations, "a neighbor list")?;
        }

        Ok(())
    }
}

fn reject_intolerant(aggregations: &[Aggregation], feature: &'static str) -> Result<(), ConfigError> {
    match aggregations.iter().find(|a| !a.tolerates_skipped_windows()) {
        Some(aggregation) => Err(ConfigError::IncompatibleAggregation {
            aggregation: aggregation.name(),
            feature,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<usize> {
        (0..15).collect()
    }

    #[test]
    fn build_applies_defaults() {
        let config = ColvarConfigBuilder::new().chain(chain()).build().unwrap();
        assert_eq!(config.aggregations, vec![Aggregation::LessThan]);
        assert_eq!(config.switching, SwitchingParams::default());
        assert_eq!(config.alignment, AlignmentMode::DistanceMatrix { lower_bound: None });
        assert!(config.pbc);
        assert!(config.strands_cutoff.is_none());
    }

    #[test]
    fn build_requires_chains() {
        assert_eq!(
            ColvarConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("chains"))
        );
    }

    #[test]
    fn build_rejects_duplicate_aggregations() {
        let result = ColvarConfigBuilder::new()
            .chain(chain())
            .aggregation(Aggregation::Min { beta: 50.0 })
            .aggregation(Aggregation::Min { beta: 10.0 })
            .build();
        assert_eq!(
            result,
            Err(ConfigError::DuplicateAggregation { aggregation: "min" })
        );
    }

    #[test]
    fn build_rejects_non_positive_beta() {
        let result = ColvarConfigBuilder::new()
            .chain(chain())
            .aggregation(Aggregation::AltMin { beta: 0.0 })
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { parameter: "beta", .. })));
    }

    #[test]
    fn build_rejects_strands_cutoff_with_minimum_aggregations() {
        let result = ColvarConfigBuilder::new()
            .chain(chain())
            .aggregations(vec![Aggregation::LessThan, Aggregation::Lowest])
            .strands_cutoff(1.0)
            .build();
        assert_eq!(
            result,
            Err(ConfigError::IncompatibleAggregation {
                aggregation: "lowest",
                feature: "a strands cutoff"
            })
        );
    }

    #[test]
    fn build_accepts_strands_cutoff_and_neighbor_list_with_sum_and_mean() {
        let config = ColvarConfigBuilder::new()
            .chain(chain())
            .aggregations(vec![Aggregation::LessThan, Aggregation::Mean])
            .strands_cutoff(1.0)
            .neighbor_list(10, 1e-4)
            .build()
            .unwrap();
        assert_eq!(config.strands_cutoff, Some(1.0));
        assert_eq!(config.neighbor_list.map(|nl| nl.stride), Some(10));
    }

    #[test]
    fn build_rejects_zero_neighbor_list_stride() {
        let result = ColvarConfigBuilder::new().chain(chain()).neighbor_list(0, 0.0).build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn build_propagates_switching_errors() {
        let result = ColvarConfigBuilder::new()
            .chain(chain())
            .switching(SwitchingParams { r0: -1.0, ..SwitchingParams::default() })
            .build();
        assert_eq!(result, Err(ConfigError::Switching(SwitchingError::InvalidR0(-1.0))));
    }

    #[test]
    fn aggregation_spec_requires_beta_for_soft_minimum() {
        let spec: AggregationSpec = toml::from_str("kind = \"min\"").unwrap();
        assert_eq!(
            spec.resolve(),
            Err(ConfigError::MissingAggregationParameter {
                aggregation: "min",
                parameter: "beta"
            })
        );
        let spec: AggregationSpec = toml::from_str("kind = \"alt-min\"\nbeta = 20.0").unwrap();
        assert_eq!(spec.resolve(), Ok(Aggregation::AltMin { beta: 20.0 }));
    }
}
