use crate::core::io::poscar::PoscarError;
use crate::core::io::volumetric::VolumetricError;
use crate::engine::config::ConfigError;
use thiserror::Error;

/// Minimum cell volume below which a lattice is treated as degenerate.
pub const MIN_CELL_VOLUME: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("degenerate lattice: cell volume {volume:.3e} is below {MIN_CELL_VOLUME:.0e}")]
    Geometry { volume: f64 },

    #[error("structure has {found} atom(s) but the analysis requires at least {required}")]
    InsufficientAtoms { found: usize, required: usize },

    #[error("scalar field contains no grid points")]
    EmptyField,

    #[error("structure file error: {0}")]
    Structure(#[from] PoscarError),

    #[error("scalar field file error: {0}")]
    Field(#[from] VolumetricError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
