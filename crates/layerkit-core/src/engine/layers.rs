use crate::core::models::structure::Structure;
use crate::engine::config::{DEFAULT_GAP_THRESHOLD, GapThreshold};

/// Stacking-axis profile of a layered structure: which axis stacks, how many
/// atomic layers it carries, and the gaps that separate layer from vacuum.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProfile {
    /// Index of the stacking axis.
    pub stacking_axis: usize,
    /// Number of atomic layers along the stacking axis.
    pub layer_count: usize,
    /// Resolved layer-split threshold in Angstroms.
    pub gap_threshold: f64,
    /// Largest unoccupied span along the stacking axis in Angstroms,
    /// including the span that wraps across the cell boundary.
    pub vacuum_gap: f64,
}

/// Returns the stacking axis for a structure: the configured override when
/// present, otherwise the longest lattice vector.
pub fn stacking_axis(structure: &Structure, override_axis: Option<usize>) -> usize {
    override_axis.unwrap_or_else(|| structure.lattice.stacking_axis())
}

/// Scans the sorted stacking-axis coordinates and derives the layer profile.
///
/// A gap larger than the threshold separates two atomic layers; the largest
/// gap (wrap-aware) is the vacuum span. In [`GapThreshold::Auto`] mode the
/// threshold is half the largest gap, capped at the fixed default.
pub fn layer_profile(structure: &Structure, axis: usize, mode: GapThreshold) -> LayerProfile {
    let mut coords: Vec<f64> = structure
        .cartesian_positions()
        .iter()
        .map(|p| p[axis])
        .collect();
    coords.sort_by(f64::total_cmp);

    let span = structure.lattice.lengths()[axis];
    let gaps: Vec<f64> = coords.windows(2).map(|w| w[1] - w[0]).collect();
    let wrap_gap = match (coords.first(), coords.last()) {
        (Some(first), Some(last)) => (span - last) + first,
        _ => 0.0,
    };
    let largest_gap = gaps
        .iter()
        .copied()
        .chain(std::iter::once(wrap_gap))
        .fold(0.0f64, f64::max);

    let gap_threshold = match mode {
        GapThreshold::Fixed(value) => value,
        GapThreshold::Auto => {
            if largest_gap > 0.0 {
                (0.5 * largest_gap).min(DEFAULT_GAP_THRESHOLD)
            } else {
                DEFAULT_GAP_THRESHOLD
            }
        }
    };

    let layer_count = if coords.is_empty() {
        0
    } else {
        1 + gaps.iter().filter(|&&gap| gap > gap_threshold).count()
    };

    LayerProfile {
        stacking_axis: axis,
        layer_count,
        gap_threshold,
        vacuum_gap: largest_gap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::lattice::Lattice;
    use nalgebra::Vector3;

    fn slab(fracs: &[[f64; 3]]) -> Structure {
        Structure::new(
            Lattice::orthorhombic(3.0, 3.0, 20.0),
            fracs
                .iter()
                .map(|f| Atom::new("Fe", Vector3::new(f[0], f[1], f[2])))
                .collect(),
        )
    }

    #[test]
    fn counts_layers_split_by_large_gaps() {
        // Stacking coordinates 2, 4, and 14 Angstroms.
        let structure = slab(&[[0.0, 0.0, 0.10], [0.0, 0.0, 0.20], [0.0, 0.0, 0.70]]);
        let profile = layer_profile(&structure, 2, GapThreshold::Fixed(1.5));
        assert_eq!(profile.layer_count, 3);
        assert_eq!(profile.gap_threshold, 1.5);
    }

    #[test]
    fn single_plane_is_one_layer() {
        let structure = slab(&[[0.0, 0.0, 0.5], [0.5, 0.5, 0.5]]);
        let profile = layer_profile(&structure, 2, GapThreshold::Auto);
        assert_eq!(profile.layer_count, 1);
    }

    #[test]
    fn vacuum_gap_wraps_across_the_cell_boundary() {
        // Atoms centered in the cell; the vacuum spans the boundary.
        let structure = slab(&[[0.0, 0.0, 0.45], [0.0, 0.0, 0.55]]);
        let profile = layer_profile(&structure, 2, GapThreshold::Auto);
        assert!((profile.vacuum_gap - 18.0).abs() < 1e-12);
    }

    #[test]
    fn auto_threshold_is_capped_at_the_default() {
        let structure = slab(&[[0.0, 0.0, 0.10], [0.0, 0.0, 0.20], [0.0, 0.0, 0.70]]);
        let profile = layer_profile(&structure, 2, GapThreshold::Auto);
        assert_eq!(profile.gap_threshold, DEFAULT_GAP_THRESHOLD);
        assert_eq!(profile.layer_count, 3);
    }

    #[test]
    fn stacking_axis_override_wins_over_detection() {
        let structure = slab(&[[0.0, 0.0, 0.5]]);
        assert_eq!(stacking_axis(&structure, None), 2);
        assert_eq!(stacking_axis(&structure, Some(0)), 0);
    }
}
