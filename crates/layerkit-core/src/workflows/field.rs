use crate::core::io::volumetric::VolumetricFile;
use crate::core::models::field::ScalarField;
use crate::engine::config::FieldConfig;
use crate::engine::error::AnalysisError;
use crate::engine::hotspots::{self, FieldAnalysis};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// A field analysis tagged with the label derived from its file name.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledFieldAnalysis {
    pub label: String,
    pub analysis: FieldAnalysis,
}

/// Runs the hotspot analysis on an in-memory scalar field.
///
/// # Errors
///
/// Returns [`AnalysisError`] for empty grids, degenerate lattices, or fields
/// without atoms.
pub fn analyze_field(
    field: &ScalarField,
    config: &FieldConfig,
) -> Result<FieldAnalysis, AnalysisError> {
    hotspots::analyze_field(field, config)
}

/// Reads a volumetric file and runs the hotspot analysis on it.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the file cannot be parsed or the analysis
/// rejects the field.
#[instrument(skip_all, name = "field_analysis")]
pub fn analyze_path<P: AsRef<Path>>(
    path: P,
    config: &FieldConfig,
) -> Result<FieldAnalysis, AnalysisError> {
    let path = path.as_ref();
    info!("Loading scalar field from {}", path.display());
    let (field, _) = VolumetricFile::read_from_path(path)?;
    let analysis = hotspots::analyze_field(&field, config)?;
    info!(
        "Field analysis of {} complete: max {:.5}, {} hotspot(s)",
        path.display(),
        analysis.summary.max_value,
        analysis.hotspots.len()
    );
    Ok(analysis)
}

/// Analyzes every volumetric file in `directory` whose name starts with
/// `prefix`, in label order: numeric labels first (sorted numerically), then
/// text labels lexicographically.
///
/// # Errors
///
/// Returns the first error encountered; per-file error recovery is the
/// caller's concern.
pub fn analyze_directory<P: AsRef<Path>>(
    directory: P,
    prefix: &str,
    config: &FieldConfig,
) -> Result<Vec<LabelledFieldAnalysis>, AnalysisError> {
    let labelled = labelled_files(directory, prefix)?;
    let mut results = Vec::with_capacity(labelled.len());
    for (label, path) in labelled {
        let analysis = analyze_path(&path, config)?;
        results.push(LabelledFieldAnalysis { label, analysis });
    }
    Ok(results)
}

/// Lists the volumetric files in `directory` whose names start with `prefix`,
/// paired with their labels and ordered numeric-first. Callers that need
/// per-file error recovery iterate this list themselves.
pub fn labelled_files<P: AsRef<Path>>(
    directory: P,
    prefix: &str,
) -> Result<Vec<(String, PathBuf)>, AnalysisError> {
    let mut labelled: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.starts_with(prefix) {
            labelled.push((label_for_name(name, prefix), path));
        }
    }
    labelled.sort_by_key(|(label, _)| label_sort_key(label));
    Ok(labelled)
}

/// Derives the label for a file name by stripping the prefix; the remainder
/// before the first dot, with "bulk" preserved as-is.
pub fn label_for_name(name: &str, prefix: &str) -> String {
    let stem = name.strip_prefix(prefix).unwrap_or(name);
    if stem.eq_ignore_ascii_case("bulk") {
        return "bulk".to_string();
    }
    stem.split('.').next().unwrap_or(stem).to_string()
}

fn label_sort_key(label: &str) -> (u8, u64, String) {
    match label.parse::<u64>() {
        Ok(number) => (0, number, String::new()),
        Err(_) => (1, 0, label.to_string()),
    }
}
