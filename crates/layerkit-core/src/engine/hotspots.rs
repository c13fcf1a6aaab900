use crate::core::models::field::ScalarField;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{PeriodicAxes, cartesian_separation, frac_separation};
use crate::engine::config::FieldConfig;
use crate::engine::error::{AnalysisError, MIN_CELL_VOLUME};
use crate::engine::layers::stacking_axis;
use nalgebra::{Point3, Vector3};

/// A ranked scalar-field hotspot.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// Position in the ranked output, starting at 1.
    pub rank: usize,
    /// Field value at the grid point.
    pub value: f64,
    /// Fractional coordinate of the grid point.
    pub frac: Vector3<f64>,
    /// Cartesian coordinate of the grid point in Angstroms.
    pub cart: Point3<f64>,
    /// Species label of the nearest atom.
    pub nearest_species: String,
    /// Minimum-image Cartesian distance to the nearest atom in Angstroms.
    pub nearest_distance: f64,
}

/// Whole-field statistics, computed from the grid independently of the
/// hotspot list.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub max_value: f64,
    pub max_frac: Vector3<f64>,
    pub max_cart: Point3<f64>,
    /// Distance from the global maximum to its nearest atom in Angstroms.
    pub nearest_distance: f64,
    pub mean_value: f64,
}

/// Result of a scalar-field analysis: summary plus up to N ranked hotspots.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAnalysis {
    pub summary: FieldSummary,
    pub hotspots: Vec<Hotspot>,
}

/// Extracts the top-N field hotspots under a minimum-separation constraint
/// and computes whole-field statistics.
///
/// Candidate policy: every grid point enters the ranking, sorted by value
/// descending with ties broken by ascending storage index (first grid axis
/// fastest). Strict local-maxima filtering is deliberately not applied: it
/// returns materially different sets on coarse or noisy grids, while the
/// separation constraint below is what governs correctness. Candidates are
/// accepted greedily while their periodic minimum-image separation (in the
/// fractional metric, wrapping on the in-plane axes only) to every accepted
/// point exceeds the configured minimum; extraction stops at N accepted
/// points or when candidates are exhausted, whichever comes first. Fewer
/// than N hotspots is not an error.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyField`] for a zero-point grid,
/// [`AnalysisError::Geometry`] for a degenerate lattice, and
/// [`AnalysisError::InsufficientAtoms`] when the field carries no atoms for
/// the nearest-atom lookup.
pub fn analyze_field(
    field: &ScalarField,
    config: &FieldConfig,
) -> Result<FieldAnalysis, AnalysisError> {
    if field.is_empty() {
        return Err(AnalysisError::EmptyField);
    }
    let structure = field.structure();
    let volume = structure.lattice.volume();
    if volume < MIN_CELL_VOLUME {
        return Err(AnalysisError::Geometry { volume });
    }
    if structure.is_empty() {
        return Err(AnalysisError::InsufficientAtoms {
            found: 0,
            required: 1,
        });
    }

    let axis = stacking_axis(structure, config.stacking_axis);
    let periodic = PeriodicAxes::in_plane_of(axis);

    let values = field.values();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

    let mut hotspots: Vec<Hotspot> = Vec::with_capacity(config.top_n);
    let mut accepted: Vec<Vector3<f64>> = Vec::with_capacity(config.top_n);
    for &flat in &order {
        if hotspots.len() == config.top_n {
            break;
        }
        let frac = field.index_to_frac(field.grid_point(flat));
        let separated = accepted
            .iter()
            .all(|other| frac_separation(other, &frac, periodic) > config.min_separation);
        if !separated {
            continue;
        }
        let (nearest_species, nearest_distance) = nearest_atom(structure, &frac, periodic);
        hotspots.push(Hotspot {
            rank: hotspots.len() + 1,
            value: values[flat],
            frac,
            cart: structure.lattice.fractional_to_cartesian(&frac),
            nearest_species,
            nearest_distance,
        });
        accepted.push(frac);
    }

    let summary = summarize(field, periodic);
    Ok(FieldAnalysis { summary, hotspots })
}

/// Locates the atom with the smallest minimum-image Cartesian distance to the
/// given fractional coordinate.
fn nearest_atom(
    structure: &Structure,
    frac: &Vector3<f64>,
    periodic: PeriodicAxes,
) -> (String, f64) {
    let mut best_species = structure.atoms[0].species.clone();
    let mut best_distance = f64::INFINITY;
    for atom in &structure.atoms {
        let distance = cartesian_separation(&structure.lattice, frac, &atom.frac, periodic);
        if distance < best_distance {
            best_distance = distance;
            best_species = atom.species.clone();
        }
    }
    (best_species, best_distance)
}

fn summarize(field: &ScalarField, periodic: PeriodicAxes) -> FieldSummary {
    let values = field.values();
    let mut max_flat = 0;
    let mut sum = 0.0;
    for (flat, &value) in values.iter().enumerate() {
        sum += value;
        if value > values[max_flat] {
            max_flat = flat;
        }
    }
    let structure = field.structure();
    let max_frac = field.index_to_frac(field.grid_point(max_flat));
    let (_, nearest_distance) = nearest_atom(structure, &max_frac, periodic);
    FieldSummary {
        max_value: values[max_flat],
        max_frac,
        max_cart: structure.lattice.fractional_to_cartesian(&max_frac),
        nearest_distance,
        mean_value: sum / values.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::lattice::Lattice;
    use crate::core::models::structure::Structure;

    fn cubic_field(dims: [usize; 3], peaks: &[([usize; 3], f64)]) -> ScalarField {
        let structure = Structure::new(
            Lattice::orthorhombic(4.0, 4.0, 4.0),
            vec![Atom::new("Fe", Vector3::new(0.0, 0.0, 0.0))],
        );
        let mut values = vec![0.0; dims[0] * dims[1] * dims[2]];
        for &([i, j, k], value) in peaks {
            values[i + dims[0] * (j + dims[1] * k)] = value;
        }
        ScalarField::new(structure, dims, values).unwrap()
    }

    fn config(top_n: usize, min_separation: f64) -> FieldConfig {
        FieldConfig::builder()
            .top_n(top_n)
            .min_separation(min_separation)
            .build()
            .unwrap()
    }

    #[test]
    fn ranks_peaks_by_descending_value() {
        let field = cubic_field([4, 4, 4], &[([1, 1, 1], 1.0), ([3, 3, 3], 0.9)]);
        let analysis = analyze_field(&field, &config(2, 0.01)).unwrap();

        assert_eq!(analysis.hotspots.len(), 2);
        assert_eq!(analysis.hotspots[0].rank, 1);
        assert_eq!(analysis.hotspots[0].value, 1.0);
        assert_eq!(
            analysis.hotspots[0].frac,
            Vector3::new(0.25, 0.25, 0.25)
        );
        assert_eq!(analysis.hotspots[1].rank, 2);
        assert_eq!(analysis.hotspots[1].value, 0.9);
        assert_eq!(
            analysis.hotspots[1].frac,
            Vector3::new(0.75, 0.75, 0.75)
        );
    }

    #[test]
    fn respects_the_minimum_separation() {
        let field = cubic_field(
            [4, 4, 4],
            &[([0, 0, 0], 1.0), ([1, 0, 0], 0.99), ([2, 2, 2], 0.98)],
        );
        let analysis = analyze_field(&field, &config(2, 0.4)).unwrap();

        // The 0.99 peak sits 0.25 from the maximum and is skipped.
        assert_eq!(analysis.hotspots.len(), 2);
        assert_eq!(analysis.hotspots[0].value, 1.0);
        assert_eq!(analysis.hotspots[1].value, 0.98);

        for a in &analysis.hotspots {
            for b in &analysis.hotspots {
                if a.rank != b.rank {
                    let separation = frac_separation(&a.frac, &b.frac, PeriodicAxes::all());
                    assert!(separation > 0.4);
                }
            }
        }
    }

    #[test]
    fn equal_maxima_within_separation_keep_the_first_by_storage_order() {
        // Two equal maxima on an otherwise empty two-point grid.
        let structure = Structure::new(
            Lattice::orthorhombic(4.0, 4.0, 4.0),
            vec![Atom::new("Fe", Vector3::new(0.0, 0.0, 0.0))],
        );
        let field = ScalarField::new(structure, [2, 1, 1], vec![1.0, 1.0]).unwrap();
        let analysis = analyze_field(&field, &config(2, 0.6)).unwrap();

        assert_eq!(analysis.hotspots.len(), 1);
        assert_eq!(analysis.hotspots[0].frac, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn returns_fewer_hotspots_when_candidates_run_out() {
        let field = cubic_field([2, 2, 1], &[([0, 0, 0], 1.0)]);
        let analysis = analyze_field(&field, &config(5, 0.9)).unwrap();
        assert!(analysis.hotspots.len() < 5);
        assert_eq!(analysis.hotspots[0].value, 1.0);
    }

    #[test]
    fn separation_wraps_in_plane_but_not_across_the_vacuum() {
        // Stacking axis is c. Two peaks at the same in-plane position near
        // the top and bottom of the cell: fractionally distant along c, and
        // c does not wrap, so both are accepted even at a large separation.
        let field = cubic_field([1, 1, 8], &[([0, 0, 0], 1.0), ([0, 0, 7], 0.9)]);
        let analysis = analyze_field(&field, &config(2, 0.5)).unwrap();
        assert_eq!(analysis.hotspots.len(), 2);
    }

    #[test]
    fn nearest_atom_lookup_wraps_in_plane_images() {
        let structure = Structure::new(
            Lattice::orthorhombic(10.0, 10.0, 20.0),
            vec![
                Atom::new("Fe", Vector3::new(0.05, 0.5, 0.25)),
                Atom::new("O", Vector3::new(0.5, 0.5, 0.25)),
            ],
        );
        let mut values = vec![0.0; 8 * 8 * 8];
        // Peak near the in-plane boundary: fractional (0.875, 0.5, 0.25).
        values[7 + 8 * (4 + 8 * 2)] = 1.0;
        let field = ScalarField::new(structure, [8, 8, 8], values).unwrap();

        let analysis = analyze_field(&field, &FieldConfig::default()).unwrap();
        let top = &analysis.hotspots[0];
        assert_eq!(top.nearest_species, "Fe");
        // Wrapped distance: |0.875 - 1.05| * 10 = 1.75 Angstroms.
        assert!((top.nearest_distance - 1.75).abs() < 1e-9);
    }

    #[test]
    fn summary_is_independent_of_the_hotspot_list() {
        let field = cubic_field([4, 4, 4], &[([1, 1, 1], 0.99), ([3, 3, 3], 0.97)]);
        let analysis = analyze_field(&field, &config(1, 0.01)).unwrap();

        assert_eq!(analysis.hotspots.len(), 1);
        assert_eq!(analysis.summary.max_value, 0.99);
        assert_eq!(analysis.summary.max_frac, Vector3::new(0.25, 0.25, 0.25));
        let expected_mean = (0.99 + 0.97) / 64.0;
        assert!((analysis.summary.mean_value - expected_mean).abs() < 1e-12);
    }

    #[test]
    fn empty_grids_are_rejected() {
        let structure = Structure::new(
            Lattice::orthorhombic(4.0, 4.0, 4.0),
            vec![Atom::new("Fe", Vector3::new(0.0, 0.0, 0.0))],
        );
        let field = ScalarField::new(structure, [0, 4, 4], Vec::new()).unwrap();
        assert!(matches!(
            analyze_field(&field, &FieldConfig::default()),
            Err(AnalysisError::EmptyField)
        ));
    }

    #[test]
    fn fields_without_atoms_are_rejected() {
        let structure = Structure::new(Lattice::orthorhombic(4.0, 4.0, 4.0), Vec::new());
        let field = ScalarField::new(structure, [2, 2, 2], vec![0.0; 8]).unwrap();
        assert!(matches!(
            analyze_field(&field, &FieldConfig::default()),
            Err(AnalysisError::InsufficientAtoms {
                found: 0,
                required: 1
            })
        ));
    }
}
