use crate::engine::bonds::{BondAnalysis, BondSummary, ViewReport};
use crate::workflows::field::LabelledFieldAnalysis;
use std::fmt::Write as _;
use std::io;

/// Renders the plain-text bond report for one analyzed file.
pub fn render_bond_report(name: &str, analysis: &BondAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {name}");
    let _ = writeln!(out, "Number of Layers: {}", analysis.layers.layer_count);
    let _ = writeln!(out);

    for view in [&analysis.unit, &analysis.primitive, &analysis.supercell] {
        render_section(&mut out, "in-plane", view, &view.in_plane);
        render_section(&mut out, "interlayer", view, &view.interlayer);
        render_stats(&mut out, view);
    }
    out
}

fn render_section(out: &mut String, class: &str, view: &ViewReport, summaries: &[BondSummary]) {
    let _ = writeln!(out, "Unique {class} bonds ({}):", view.view);
    for summary in summaries {
        let _ = writeln!(
            out,
            "{}: {:.3} Angstrom, Count: {}",
            summary.pair, summary.length, summary.count
        );
    }
    let _ = writeln!(out);
}

fn render_stats(out: &mut String, view: &ViewReport) {
    let _ = writeln!(
        out,
        "Bond statistics ({}): {} unique bond(s)",
        view.view, view.unique_bonds
    );
    for stats in &view.pair_stats {
        let _ = writeln!(
            out,
            "{}: min {:.3}, mean {:.3}, max {:.3} Angstrom",
            stats.pair, stats.min, stats.mean, stats.max
        );
    }
    let _ = writeln!(out);
}

/// Separator written between per-file blocks in batch reports.
pub fn report_separator() -> String {
    format!("\n{}\n\n", "-".repeat(40))
}

/// Renders the tab-separated metrics table for a labelled batch.
pub fn render_field_data_table(results: &[LabelledFieldAnalysis]) -> String {
    let mut out = String::from("Label\tMaxValue\tNearestDist\tMeanValue\n");
    for item in results {
        let summary = &item.analysis.summary;
        let _ = writeln!(
            out,
            "{}\t{:.5}\t{:.5}\t{:.5}",
            item.label, summary.max_value, summary.nearest_distance, summary.mean_value
        );
    }
    out
}

/// Renders the tab-separated coordinates table for a labelled batch.
pub fn render_field_coords_table(results: &[LabelledFieldAnalysis]) -> String {
    let mut out = String::from("Label\tMaxFracCoord\tMaxCartCoord\n");
    for item in results {
        let summary = &item.analysis.summary;
        let frac = summary
            .max_frac
            .iter()
            .map(|v| format!("{v:.5}"))
            .collect::<Vec<_>>()
            .join("\t");
        let cart = summary
            .max_cart
            .coords
            .iter()
            .map(|v| format!("{v:.5}"))
            .collect::<Vec<_>>()
            .join("\t");
        let _ = writeln!(out, "{}\t{frac}\t{cart}", item.label);
    }
    out
}

/// Writes the ranked hotspot tables of a labelled batch as CSV.
pub fn write_hotspot_csv<W: io::Write>(
    writer: W,
    results: &[LabelledFieldAnalysis],
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "label",
        "rank",
        "value",
        "frac_a",
        "frac_b",
        "frac_c",
        "cart_x",
        "cart_y",
        "cart_z",
        "nearest_species",
        "nearest_distance",
    ])?;
    for item in results {
        for hotspot in &item.analysis.hotspots {
            csv_writer.write_record([
                item.label.clone(),
                hotspot.rank.to_string(),
                format!("{:.6}", hotspot.value),
                format!("{:.6}", hotspot.frac.x),
                format!("{:.6}", hotspot.frac.y),
                format!("{:.6}", hotspot.frac.z),
                format!("{:.6}", hotspot.cart.x),
                format!("{:.6}", hotspot.cart.y),
                format!("{:.6}", hotspot.cart.z),
                hotspot.nearest_species.clone(),
                format!("{:.6}", hotspot.nearest_distance),
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the deduplicated bond summaries of a batch of analyses as CSV,
/// one row per bond entry.
pub fn write_bond_csv<W: io::Write>(
    writer: W,
    analyses: &[(String, BondAnalysis)],
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["file", "view", "class", "pair", "length", "count"])?;
    for (name, analysis) in analyses {
        for view in [&analysis.unit, &analysis.primitive, &analysis.supercell] {
            for summary in view.in_plane.iter().chain(&view.interlayer) {
                csv_writer.write_record([
                    name.clone(),
                    view.view.to_string(),
                    summary.class.to_string(),
                    summary.pair.to_string(),
                    format!("{:.3}", summary.length),
                    summary.count.to_string(),
                ])?;
            }
        }
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::field::ScalarField;
    use crate::core::models::lattice::Lattice;
    use crate::core::models::structure::Structure;
    use crate::engine::config::{BondConfig, FieldConfig};
    use crate::workflows;
    use nalgebra::Vector3;

    fn sample_bond_analysis() -> BondAnalysis {
        let structure = Structure::new(
            Lattice::orthorhombic(3.0, 3.0, 3.0),
            vec![
                Atom::new("Fe", Vector3::new(0.0, 0.0, 0.0)),
                Atom::new("Fe", Vector3::new(0.5, 0.0, 0.0)),
            ],
        );
        workflows::bonds::analyze_structure(&structure, &BondConfig::default()).unwrap()
    }

    fn sample_field_results() -> Vec<LabelledFieldAnalysis> {
        let structure = Structure::new(
            Lattice::orthorhombic(4.0, 4.0, 4.0),
            vec![Atom::new("Fe", Vector3::new(0.0, 0.0, 0.0))],
        );
        let mut values = vec![0.0; 64];
        values[1 + 4 * (1 + 4)] = 1.0;
        let field = ScalarField::new(structure, [4, 4, 4], values).unwrap();
        let analysis = workflows::field::analyze_field(&field, &FieldConfig::default()).unwrap();
        vec![LabelledFieldAnalysis {
            label: "2".to_string(),
            analysis,
        }]
    }

    #[test]
    fn bond_report_lists_every_view_section() {
        let report = render_bond_report("slab.vasp", &sample_bond_analysis());
        assert!(report.starts_with("File: slab.vasp\n"));
        assert!(report.contains("Number of Layers: 1"));
        assert!(report.contains("Unique in-plane bonds (unit cell):"));
        assert!(report.contains("Unique interlayer bonds (unit cell):"));
        assert!(report.contains("Unique in-plane bonds (primitive cell):"));
        assert!(report.contains("Unique in-plane bonds (supercell):"));
        assert!(report.contains("Fe-Fe: 1.500 Angstrom, Count: 1"));
        assert!(report.contains("Bond statistics (unit cell): 1 unique bond(s)"));
    }

    #[test]
    fn field_tables_carry_labels_and_metrics() {
        let results = sample_field_results();
        let data = render_field_data_table(&results);
        assert!(data.starts_with("Label\tMaxValue\tNearestDist\tMeanValue\n"));
        assert!(data.contains("2\t1.00000\t"));

        let coords = render_field_coords_table(&results);
        assert!(coords.starts_with("Label\tMaxFracCoord\tMaxCartCoord\n"));
        assert!(coords.contains("0.25000"));
    }

    #[test]
    fn hotspot_csv_has_one_row_per_hotspot() {
        let results = sample_field_results();
        let mut buffer = Vec::new();
        write_hotspot_csv(&mut buffer, &results).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "label,rank,value,frac_a,frac_b,frac_c,cart_x,cart_y,cart_z,nearest_species,nearest_distance");
        assert_eq!(lines.len(), 1 + results[0].analysis.hotspots.len());
        assert!(lines[1].starts_with("2,1,1.000000,0.250000,0.250000,0.250000"));
    }

    #[test]
    fn bond_csv_covers_all_views() {
        let analyses = vec![("slab.vasp".to_string(), sample_bond_analysis())];
        let mut buffer = Vec::new();
        write_bond_csv(&mut buffer, &analyses).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("slab.vasp,unit cell,in-plane,Fe-Fe,1.500,1"));
        assert!(text.contains("slab.vasp,supercell,in-plane,Fe-Fe,"));
    }
}
