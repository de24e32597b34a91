use molsurf::engine::config::ConfigError;
use molsurf::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid scene: {0}")]
    Scene(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
