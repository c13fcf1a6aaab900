use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::bonds::{self, BondAnalysis};
use crate::engine::config::BondConfig;
use crate::engine::error::AnalysisError;
use std::path::Path;
use tracing::{info, instrument};

/// Runs the bond analysis on an in-memory structure.
///
/// # Errors
///
/// Returns [`AnalysisError`] for degenerate lattices or structures with too
/// few atoms.
pub fn analyze_structure(
    structure: &Structure,
    config: &BondConfig,
) -> Result<BondAnalysis, AnalysisError> {
    bonds::analyze_structure(structure, config)
}

/// Reads a positional structure file and runs the bond analysis on it.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the file cannot be parsed or the analysis
/// rejects the structure.
#[instrument(skip_all, name = "bond_analysis")]
pub fn analyze_path<P: AsRef<Path>>(
    path: P,
    config: &BondConfig,
) -> Result<BondAnalysis, AnalysisError> {
    let path = path.as_ref();
    info!("Loading structure from {}", path.display());
    let (structure, _) = PoscarFile::read_from_path(path)?;
    let analysis = bonds::analyze_structure(&structure, config)?;
    info!(
        "Bond analysis of {} complete: {} layer(s), {} unique unit-cell bond(s)",
        path.display(),
        analysis.layers.layer_count,
        analysis.unit.unique_bonds
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SLAB: &str = "\
Fe slab
1.0
3.0 0.0 0.0
0.0 3.0 0.0
0.0 0.0 20.0
Fe
2
Direct
0.25 0.25 0.50
0.25 0.25 0.60
";

    #[test]
    fn analyze_path_reads_and_analyzes_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SLAB.as_bytes()).unwrap();

        let analysis = analyze_path(file.path(), &BondConfig::default()).unwrap();
        assert_eq!(analysis.layers.layer_count, 2);
        assert_eq!(analysis.unit.interlayer.len(), 1);
    }

    #[test]
    fn analyze_path_propagates_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not a structure\n").unwrap();

        assert!(matches!(
            analyze_path(file.path(), &BondConfig::default()),
            Err(AnalysisError::Structure(_))
        ));
    }
}
