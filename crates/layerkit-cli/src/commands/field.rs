use crate::cli::FieldArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::batch_progress;
use layerkit::engine::config::{FieldConfig, FieldConfigBuilder};
use layerkit::engine::error::AnalysisError;
use layerkit::engine::hotspots::FieldAnalysis;
use layerkit::workflows;
use layerkit::workflows::field::LabelledFieldAnalysis;
use layerkit::workflows::report;
use rayon::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub fn run(args: FieldArgs) -> Result<()> {
    let config = build_config(&args)?;

    if let Some(file) = &args.file {
        let analysis = workflows::field::analyze_path(file, &config)?;
        print_single(&analysis);
        if let Some(csv_path) = &args.csv {
            let label = workflows::field::label_for_name(
                file.file_name().and_then(|n| n.to_str()).unwrap_or("field"),
                &args.prefix,
            );
            let results = vec![LabelledFieldAnalysis { label, analysis }];
            report::write_hotspot_csv(File::create(csv_path)?, &results)?;
            println!("Hotspot table written to {}", csv_path.display());
        }
        return Ok(());
    }

    let Some(directory) = &args.directory else {
        return Err(CliError::Argument(
            "either --file or --directory is required".to_string(),
        ));
    };
    let labelled = workflows::field::labelled_files(directory, &args.prefix)
        .map_err(CliError::Analysis)?;
    if labelled.is_empty() {
        return Err(CliError::Argument(format!(
            "no volumetric files with prefix '{}' found in {}",
            args.prefix,
            directory.display()
        )));
    }
    info!("Analyzing {} volumetric file(s)", labelled.len());

    let progress = batch_progress(labelled.len() as u64);
    let outcomes: Vec<(String, PathBuf, std::result::Result<FieldAnalysis, AnalysisError>)> =
        labelled
            .par_iter()
            .map(|(label, path)| {
                let result = workflows::field::analyze_path(path, &config);
                progress.inc(1);
                (label.clone(), path.clone(), result)
            })
            .collect();
    progress.finish_and_clear();

    let mut results: Vec<LabelledFieldAnalysis> = Vec::new();
    let mut failed = 0usize;
    for (label, path, outcome) in outcomes {
        match outcome {
            Ok(analysis) => results.push(LabelledFieldAnalysis { label, analysis }),
            Err(e) => {
                failed += 1;
                error!("Failed to analyze '{}': {e}", path.display());
            }
        }
    }
    if results.is_empty() {
        return Err(CliError::Argument(format!(
            "all {failed} volumetric file(s) failed to analyze"
        )));
    }
    if failed > 0 {
        warn!("{failed} file(s) failed and were skipped");
    }

    std::fs::write(&args.data_output, report::render_field_data_table(&results))?;
    std::fs::write(
        &args.coords_output,
        report::render_field_coords_table(&results),
    )?;
    println!(
        "Field metrics written to {} and {}",
        args.data_output.display(),
        args.coords_output.display()
    );

    if let Some(csv_path) = &args.csv {
        report::write_hotspot_csv(File::create(csv_path)?, &results)?;
        println!("Hotspot table written to {}", csv_path.display());
    }
    Ok(())
}

fn build_config(args: &FieldArgs) -> Result<FieldConfig> {
    let mut builder = FieldConfigBuilder::new()
        .top_n(args.top_n)
        .min_separation(args.min_separation);
    if let Some(axis) = args.stacking_axis {
        builder = builder.stacking_axis(axis);
    }
    Ok(builder.build().map_err(AnalysisError::from)?)
}

fn print_single(analysis: &FieldAnalysis) {
    let summary = &analysis.summary;
    println!("Highest Value: {:.5}", summary.max_value);
    println!(
        "Location in Fractional Coordinates: [{:.5}, {:.5}, {:.5}]",
        summary.max_frac.x, summary.max_frac.y, summary.max_frac.z
    );
    println!(
        "Location in Cartesian Coordinates: [{:.5}, {:.5}, {:.5}]",
        summary.max_cart.x, summary.max_cart.y, summary.max_cart.z
    );
    println!(
        "Shortest Distance to an Atom (Angstroms): {:.5}",
        summary.nearest_distance
    );
    println!("Average Value: {:.5}", summary.mean_value);
    println!();
    println!("Hotspots:");
    for hotspot in &analysis.hotspots {
        println!(
            "  #{}: value {:.5} at [{:.5}, {:.5}, {:.5}], nearest {} at {:.5} Angstroms",
            hotspot.rank,
            hotspot.value,
            hotspot.frac.x,
            hotspot.frac.y,
            hotspot.frac.z,
            hotspot.nearest_species,
            hotspot.nearest_distance
        );
    }
}
