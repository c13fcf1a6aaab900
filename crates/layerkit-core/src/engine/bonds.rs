use crate::core::models::lattice::in_plane_axes;
use crate::core::models::structure::Structure;
use crate::engine::config::BondConfig;
use crate::engine::error::{AnalysisError, MIN_CELL_VOLUME};
use crate::engine::layers::{LayerProfile, layer_profile, stacking_axis};
use crate::engine::primitive::primitive_reduction;
use nalgebra::Vector3;
use std::fmt;

/// Distance below which a pair is treated as coincident atoms, not a bond.
const MIN_BOND_LENGTH: f64 = 1e-6;

/// Tolerance for the in-plane/interlayer tie-break: displacements whose
/// stacking and in-plane components agree within this margin classify as
/// in-plane.
const CLASSIFY_TOLERANCE: f64 = 1e-6;

/// The three independent enumeration views of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Unit,
    Primitive,
    Supercell,
}

impl fmt::Display for CellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellView::Unit => write!(f, "unit cell"),
            CellView::Primitive => write!(f, "primitive cell"),
            CellView::Supercell => write!(f, "supercell"),
        }
    }
}

/// Classification of a bond by the orientation of its displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondClass {
    InPlane,
    Interlayer,
}

impl fmt::Display for BondClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondClass::InPlane => write!(f, "in-plane"),
            BondClass::Interlayer => write!(f, "interlayer"),
        }
    }
}

/// Canonical unordered species pair, stored in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesPair(String, String);

impl SpeciesPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

impl fmt::Display for SpeciesPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// A deduplicated bond entry: one representative length and the number of
/// merged occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct BondSummary {
    pub pair: SpeciesPair,
    pub class: BondClass,
    /// Representative length in Angstroms (first observation, rounded to
    /// 1e-3).
    pub length: f64,
    /// Number of raw bonds merged into this entry.
    pub count: usize,
}

/// Distance statistics for one species pair within a view.
#[derive(Debug, Clone, PartialEq)]
pub struct PairStats {
    pub pair: SpeciesPair,
    /// Unique (deduplicated) lengths, ascending.
    pub lengths: Vec<f64>,
    pub min: f64,
    pub max: f64,
    /// Occurrence-weighted mean length.
    pub mean: f64,
}

/// Bond report for one enumeration view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewReport {
    pub view: CellView,
    /// Number of deduplicated bond entries across both classes.
    pub unique_bonds: usize,
    pub in_plane: Vec<BondSummary>,
    pub interlayer: Vec<BondSummary>,
    pub pair_stats: Vec<PairStats>,
}

/// Full bond analysis: layer profile plus one independently computed report
/// per view.
#[derive(Debug, Clone, PartialEq)]
pub struct BondAnalysis {
    pub layers: LayerProfile,
    pub unit: ViewReport,
    pub primitive: ViewReport,
    pub supercell: ViewReport,
}

/// Enumerates, classifies, deduplicates, and aggregates bonds for the unit
/// cell, the primitive cell, and the 3x3x1 in-plane supercell.
///
/// # Errors
///
/// Returns [`AnalysisError::Geometry`] for a degenerate lattice and
/// [`AnalysisError::InsufficientAtoms`] for structures with fewer than two
/// atoms.
pub fn analyze_structure(
    structure: &Structure,
    config: &BondConfig,
) -> Result<BondAnalysis, AnalysisError> {
    let volume = structure.lattice.volume();
    if volume < MIN_CELL_VOLUME {
        return Err(AnalysisError::Geometry { volume });
    }
    if structure.len() < 2 {
        return Err(AnalysisError::InsufficientAtoms {
            found: structure.len(),
            required: 2,
        });
    }

    let axis = stacking_axis(structure, config.stacking_axis);
    let layers = layer_profile(structure, axis, config.gap_threshold);

    let unit = enumerate_view(structure, axis, CellView::Unit, config);
    let reduced = primitive_reduction(structure, axis, config.reduction_tolerance);
    let primitive = enumerate_view(&reduced, axis, CellView::Primitive, config);
    let supercell = enumerate_view(structure, axis, CellView::Supercell, config);

    Ok(BondAnalysis {
        layers,
        unit,
        primitive,
        supercell,
    })
}

struct RawBond {
    pair: SpeciesPair,
    class: BondClass,
    length: f64,
}

/// True if the integer shift is lexicographically positive, i.e. its first
/// nonzero component is positive. Self-image pairs keep only these shifts so
/// each undirected pair appears once.
fn lex_positive(shift: &[i32; 3]) -> bool {
    for &component in shift {
        if component > 0 {
            return true;
        }
        if component < 0 {
            return false;
        }
    }
    false
}

fn shift_values(axis_is_in_plane: bool, view: CellView) -> Vec<i32> {
    match view {
        CellView::Supercell if axis_is_in_plane => vec![-1, 0, 1],
        _ => vec![0],
    }
}

fn enumerate_view(
    structure: &Structure,
    axis: usize,
    view: CellView,
    config: &BondConfig,
) -> ViewReport {
    let lattice = &structure.lattice;
    let normal = lattice.plane_normal(axis);
    let (p, q) = in_plane_axes(axis);

    let mut shifts: Vec<[i32; 3]> = Vec::new();
    let mut grid = [vec![0], vec![0], vec![0]];
    grid[p] = shift_values(true, view);
    grid[q] = shift_values(true, view);
    grid[axis] = shift_values(false, view);
    for &i in &grid[0] {
        for &j in &grid[1] {
            for &k in &grid[2] {
                shifts.push([i, j, k]);
            }
        }
    }

    let positions = structure.cartesian_positions();
    let mut raw = Vec::new();
    for i in 0..structure.len() {
        for j in i..structure.len() {
            for shift in &shifts {
                if i == j && !lex_positive(shift) {
                    continue;
                }
                let shifted = structure.atoms[j].frac
                    + Vector3::new(
                        f64::from(shift[0]),
                        f64::from(shift[1]),
                        f64::from(shift[2]),
                    );
                let displacement = lattice.fractional_to_cartesian(&shifted) - positions[i];
                let length = displacement.norm();
                if length < MIN_BOND_LENGTH || length > config.max_distance {
                    continue;
                }
                raw.push(RawBond {
                    pair: SpeciesPair::new(
                        &structure.atoms[i].species,
                        &structure.atoms[j].species,
                    ),
                    class: classify(&displacement, normal.as_ref()),
                    length,
                });
            }
        }
    }

    summarize_view(view, raw, config.merge_tolerance)
}

/// Classifies a displacement by comparing its stacking-axis component against
/// its in-plane projection. Near-equal components classify as in-plane.
fn classify(displacement: &Vector3<f64>, normal: Option<&Vector3<f64>>) -> BondClass {
    let Some(normal) = normal else {
        return BondClass::InPlane;
    };
    let stacking = displacement.dot(normal).abs();
    let in_plane = (displacement.norm_squared() - stacking * stacking)
        .max(0.0)
        .sqrt();
    if stacking > in_plane + CLASSIFY_TOLERANCE {
        BondClass::Interlayer
    } else {
        BondClass::InPlane
    }
}

/// Merges a length observation into an existing entry within `tolerance`, or
/// appends a new entry keyed by the length rounded to 1e-3. Applying this to
/// an already-merged list leaves it unchanged.
pub(crate) fn merge_length(entries: &mut Vec<(f64, usize)>, length: f64, tolerance: f64) {
    for (existing, count) in entries.iter_mut() {
        if (*existing - length).abs() <= tolerance {
            *count += 1;
            return;
        }
    }
    entries.push(((length * 1000.0).round() / 1000.0, 1));
}

fn summarize_view(view: CellView, raw: Vec<RawBond>, tolerance: f64) -> ViewReport {
    // Group by (pair, class) preserving first-seen order, then merge lengths.
    let mut groups: Vec<((SpeciesPair, BondClass), Vec<(f64, usize)>)> = Vec::new();
    for bond in &raw {
        let key = (bond.pair.clone(), bond.class);
        let index = match groups.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        merge_length(&mut groups[index].1, bond.length, tolerance);
    }

    let mut in_plane = Vec::new();
    let mut interlayer = Vec::new();
    for ((pair, class), entries) in &groups {
        for &(length, count) in entries {
            let summary = BondSummary {
                pair: pair.clone(),
                class: *class,
                length,
                count,
            };
            match class {
                BondClass::InPlane => in_plane.push(summary),
                BondClass::Interlayer => interlayer.push(summary),
            }
        }
    }
    in_plane.sort_by(|a, b| a.length.total_cmp(&b.length));
    interlayer.sort_by(|a, b| a.length.total_cmp(&b.length));

    let mut pair_stats: Vec<PairStats> = Vec::new();
    for summary in in_plane.iter().chain(&interlayer) {
        if !pair_stats.iter().any(|s| s.pair == summary.pair) {
            pair_stats.push(PairStats {
                pair: summary.pair.clone(),
                lengths: Vec::new(),
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                mean: 0.0,
            });
        }
    }
    for stats in &mut pair_stats {
        let mut weighted_sum = 0.0;
        let mut total = 0usize;
        for summary in in_plane.iter().chain(&interlayer) {
            if summary.pair != stats.pair {
                continue;
            }
            stats.lengths.push(summary.length);
            stats.min = stats.min.min(summary.length);
            stats.max = stats.max.max(summary.length);
            weighted_sum += summary.length * summary.count as f64;
            total += summary.count;
        }
        stats.lengths.sort_by(f64::total_cmp);
        stats.mean = weighted_sum / total as f64;
    }
    pair_stats.sort_by(|a, b| a.pair.cmp(&b.pair));

    ViewReport {
        view,
        unique_bonds: in_plane.len() + interlayer.len(),
        in_plane,
        interlayer,
        pair_stats,
    }
}
