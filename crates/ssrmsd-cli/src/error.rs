use ssrmsd::core::io::xyz::XyzError;
use ssrmsd::core::templates::RegistryError;
use ssrmsd::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read trajectory '{path}': {source}", path = path.display())]
    Trajectory {
        path: PathBuf,
        #[source]
        source: XyzError,
    },

    #[error("Failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to open log file '{path}': {source}", path = path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
