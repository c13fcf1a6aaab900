//! Input staging for an external simulator.
//!
//! Builds layered slab structures from a prototype, renders scheduler job
//! scripts from templates, and lays out run directories. No physics is
//! computed here; the staged inputs are consumed by an external code whose
//! outputs feed the [`crate::engine`] analyses.

pub mod jobs;
pub mod layers;
pub mod settings;

use crate::core::io::poscar::PoscarError;
use self::settings::SettingsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("failed to read template '{path}': {source}", path = path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no potential data found for element {element} under '{root}'", root = root.display())]
    PotentialNotFound { element: String, root: PathBuf },

    #[error("structure file error: {0}")]
    Structure(#[from] PoscarError),

    #[error("invalid staging request: {0}")]
    InvalidRequest(String),

    #[error("job submission via '{command}' failed: {message}")]
    Submit { command: String, message: String },
}
