use super::LengthUnits;
use super::builtin::{self, PEPTOID_BOND_LENGTH, PEPTOID_RESIDUE_ATOMS};
use crate::core::models::template::{ReferenceTemplate, TemplateError};
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One template as written in a TOML file; lengths in Ångström.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TemplateDefinition {
    pub residue_atoms: usize,
    pub coordinates: Vec<[f64; 3]>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub bond_length: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TemplateDefinition {
    fn build(&self, name: &str, factor: f64) -> Result<ReferenceTemplate, TemplateError> {
        let coordinates = self
            .coordinates
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect();
        let mut template = ReferenceTemplate::new(name, self.residue_atoms, coordinates)?;
        if let Some(weights) = &self.weights {
            template = template.with_weights(weights.clone())?;
        }
        if let Some(bond_length) = self.bond_length {
            template = template.with_bond_length(bond_length);
        }
        Ok(template.scaled(factor))
    }
}

/// Short description of a registry entry for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSummary {
    pub name: String,
    pub keyword: Option<&'static str>,
    pub description: String,
    pub residue_atoms: usize,
    pub atoms: usize,
}

/// Built-in motifs plus any templates loaded from files. File entries shadow
/// built-ins of the same name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    custom: HashMap<String, TemplateDefinition>,
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Loads a TOML file whose top-level tables are templates keyed by name.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::builtin();
        registry.extend_from_file(path)?;
        Ok(registry)
    }

    pub fn extend_from_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let definitions: HashMap<String, TemplateDefinition> =
            toml::from_str(&content).map_err(|e| RegistryError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        self.custom.extend(definitions);
        Ok(())
    }

    /// Builds the named template with coordinates converted into `units`.
    pub fn get(&self, name: &str, units: LengthUnits) -> Result<ReferenceTemplate, RegistryError> {
        let factor = units.from_angstrom();
        if let Some(definition) = self.custom.get(name) {
            return Ok(definition.build(name, factor)?);
        }

        let (canonical, motif) =
            builtin::lookup(name).ok_or_else(|| RegistryError::UnknownMotif(name.to_string()))?;
        let coordinates = motif
            .coordinates
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect();
        let template = ReferenceTemplate::new(canonical, PEPTOID_RESIDUE_ATOMS, coordinates)?
            .with_bond_length(PEPTOID_BOND_LENGTH);
        Ok(template.scaled(factor))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name) || builtin::lookup(name).is_some()
    }

    /// All entries, sorted by name.
    pub fn summaries(&self) -> Vec<TemplateSummary> {
        let builtins = builtin::MOTIFS
            .entries()
            .filter(|(name, _)| !self.custom.contains_key(**name))
            .map(|(name, motif)| TemplateSummary {
                name: name.to_string(),
                keyword: Some(motif.keyword),
                description: motif.description.to_string(),
                residue_atoms: PEPTOID_RESIDUE_ATOMS,
                atoms: motif.coordinates.len(),
            });
        let custom = self.custom.iter().map(|(name, definition)| TemplateSummary {
            name: name.clone(),
            keyword: None,
            description: definition.description.clone().unwrap_or_default(),
            residue_atoms: definition.residue_atoms,
            atoms: definition.coordinates.len(),
        });

        let mut summaries: Vec<TemplateSummary> = builtins.chain(custom).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown reference motif '{0}'")]
    UnknownMotif(String),
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
}
