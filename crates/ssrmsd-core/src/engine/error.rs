use thiserror::Error;

use super::config::ConfigError;
use crate::core::geometry::alignment::AlignmentError;
use crate::core::geometry::pbc::GeometryError;
use crate::core::models::chain::ChainError;
use crate::core::models::template::TemplateError;
use crate::core::templates::RegistryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid backbone: {0}")]
    Chain(#[from] ChainError),

    #[error("Invalid reference template: {0}")]
    Template(#[from] TemplateError),

    #[error("Template registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Alignment setup failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Atom index {index} is out of range for {available} supplied positions")]
    AtomOutOfRange { index: usize, available: usize },
}

impl EngineError {
    /// Errors raised while setting up, before any coordinates are seen.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            EngineError::Geometry(_) | EngineError::AtomOutOfRange { .. }
        )
    }
}
