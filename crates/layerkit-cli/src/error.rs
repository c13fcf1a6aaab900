use layerkit::engine::error::AnalysisError;
use layerkit::staging::StagingError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("Failed to process '{path}': {source}", path = path.display())]
    FileProcessing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Report export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
