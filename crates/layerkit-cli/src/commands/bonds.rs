use crate::cli::BondsArgs;
use crate::error::{CliError, Result};
use crate::utils::pattern::matches_pattern;
use crate::utils::progress::batch_progress;
use layerkit::engine::bonds::BondAnalysis;
use layerkit::engine::config::{BondConfig, GapThreshold};
use layerkit::engine::error::AnalysisError;
use layerkit::workflows;
use layerkit::workflows::report;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub fn run(args: BondsArgs) -> Result<()> {
    let config = build_config(&args)?;
    let files = collect_input_files(&args)?;
    info!("Analyzing {} structure file(s)", files.len());

    let progress = batch_progress(files.len() as u64);
    let results: Vec<(PathBuf, std::result::Result<BondAnalysis, AnalysisError>)> = files
        .par_iter()
        .map(|path| {
            let result = workflows::bonds::analyze_path(path, &config);
            progress.inc(1);
            (path.clone(), result)
        })
        .collect();
    progress.finish_and_clear();

    let mut report_text = String::new();
    let mut succeeded: Vec<(String, BondAnalysis)> = Vec::new();
    let mut failed = 0usize;
    for (path, result) in results {
        let name = display_name(&path);
        match result {
            Ok(analysis) => {
                report_text.push_str(&report::render_bond_report(&name, &analysis));
                report_text.push_str(&report::report_separator());
                succeeded.push((name, analysis));
            }
            Err(e) => {
                failed += 1;
                error!("Failed to analyze '{}': {e}", path.display());
            }
        }
    }

    if succeeded.is_empty() {
        return Err(CliError::Argument(format!(
            "all {failed} input file(s) failed to analyze"
        )));
    }
    if failed > 0 {
        warn!("{failed} file(s) failed and were skipped");
    }

    std::fs::write(&args.output, report_text)?;
    println!("Bond analysis written to {}", args.output.display());

    if let Some(csv_path) = &args.csv {
        report::write_bond_csv(File::create(csv_path)?, &succeeded)?;
        println!("Bond table written to {}", csv_path.display());
    }
    Ok(())
}

fn build_config(args: &BondsArgs) -> Result<BondConfig> {
    let mut builder = BondConfig::builder().max_distance(args.max_distance);
    if let Some(tolerance) = args.merge_tolerance {
        builder = builder.merge_tolerance(tolerance);
    }
    if let Some(gap) = args.gap_threshold {
        builder = builder.gap_threshold(GapThreshold::Fixed(gap));
    }
    if let Some(axis) = args.stacking_axis {
        builder = builder.stacking_axis(axis);
    }
    Ok(builder.build().map_err(AnalysisError::from)?)
}

fn collect_input_files(args: &BondsArgs) -> Result<Vec<PathBuf>> {
    if !args.input.is_dir() {
        return Ok(vec![args.input.clone()]);
    }
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(&args.input)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && matches_pattern(name, &args.pattern) {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        return Err(CliError::Argument(format!(
            "no files matched pattern '{}' in {}",
            args.pattern,
            args.input.display()
        )));
    }
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
