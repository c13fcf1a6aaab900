use crate::core::models::atom::Atom;
use crate::core::models::lattice::{Lattice, in_plane_axes};
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::wrap_frac;
use nalgebra::{Matrix3, RowVector3, Vector3};
use std::collections::HashMap;

/// Cartesian distance below which two mapped atom positions collapse into one
/// primitive-cell site. Well below any physical interatomic distance and far
/// above the mapping noise of a valid translation.
const SITE_MERGE_DISTANCE: f64 = 0.1;

/// Tolerance on the sub-cell area fraction when pairing basis candidates.
const AREA_TOLERANCE: f64 = 1e-6;

/// Reduces a structure to its primitive cell by detecting in-plane
/// translational sub-periodicity.
///
/// Candidate translations are fractional differences between same-species
/// atoms whose stacking-axis separation vanishes; the stacking axis is
/// excluded from the search because vacuum padding breaks periodicity along
/// it. A candidate is valid when it maps every atom onto an atom of the same
/// species within `tolerance` (fractional, per axis, with in-plane wrapping).
/// The reduced cell keeps the stacking vector and replaces the in-plane pair
/// with the shortest valid vectors whose sub-cell area matches the
/// translation-group order. If no smaller periodicity is found, the input is
/// returned unchanged.
///
/// The search is bounded: there are at most as many candidates as atoms of
/// the rarest species, and the group order divides the atom count.
pub fn primitive_reduction(structure: &Structure, stacking_axis: usize, tolerance: f64) -> Structure {
    let n = structure.len();
    if n < 2 {
        return structure.clone();
    }

    let fracs: Vec<Vector3<f64>> = structure.atoms.iter().map(|a| wrap_frac(&a.frac)).collect();

    let reference = match reference_atom(structure) {
        Some(index) => index,
        None => return structure.clone(),
    };

    let mut valid: Vec<Vector3<f64>> = Vec::new();
    for (index, atom) in structure.atoms.iter().enumerate() {
        if index == reference || atom.species != structure.atoms[reference].species {
            continue;
        }
        let shift = fracs[index] - fracs[reference];
        let stacking_offset = shift[stacking_axis] - shift[stacking_axis].round();
        if stacking_offset.abs() > tolerance {
            continue;
        }
        let mut candidate = wrap_frac(&shift);
        candidate[stacking_axis] = 0.0;
        if candidate.iter().all(|c| nearly_integer(*c, tolerance)) {
            continue;
        }
        if valid
            .iter()
            .any(|seen| translations_match(seen, &candidate, tolerance))
        {
            continue;
        }
        if maps_structure_onto_itself(structure, &fracs, &candidate, tolerance) {
            valid.push(candidate);
        }
    }

    if valid.is_empty() {
        return structure.clone();
    }

    let order = valid.len() + 1;
    if n % order != 0 {
        return structure.clone();
    }

    let (p, q) = in_plane_axes(stacking_axis);
    let Some((v1, v2)) = select_basis_pair(&structure.lattice, &valid, p, q, order) else {
        return structure.clone();
    };

    reduce_with_basis(structure, &fracs, stacking_axis, p, q, &v1, &v2, order)
        .unwrap_or_else(|| structure.clone())
}

/// Picks the species with the fewest atoms (ties to the earliest first
/// occurrence) and returns the index of its first atom.
fn reference_atom(structure: &Structure) -> Option<usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for atom in &structure.atoms {
        *counts.entry(atom.species.as_str()).or_insert(0) += 1;
    }
    structure
        .atoms
        .iter()
        .enumerate()
        .min_by_key(|(index, atom)| (counts[atom.species.as_str()], *index))
        .map(|(index, _)| index)
}

fn nearly_integer(value: f64, tolerance: f64) -> bool {
    (value - value.round()).abs() <= tolerance
}

fn translations_match(a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> bool {
    (0..3).all(|axis| nearly_integer(a[axis] - b[axis], tolerance))
}

fn maps_structure_onto_itself(
    structure: &Structure,
    fracs: &[Vector3<f64>],
    shift: &Vector3<f64>,
    tolerance: f64,
) -> bool {
    structure.atoms.iter().enumerate().all(|(index, atom)| {
        let target = fracs[index] + shift;
        structure
            .atoms
            .iter()
            .enumerate()
            .any(|(other, candidate)| {
                candidate.species == atom.species
                    && translations_match(&target, &fracs[other], tolerance)
            })
    })
}

/// Finds the shortest pair of in-plane fractional vectors (valid translations
/// plus the original in-plane basis vectors) whose sub-cell area is `1/order`
/// of the original in-plane cell.
fn select_basis_pair(
    lattice: &Lattice,
    valid: &[Vector3<f64>],
    p: usize,
    q: usize,
    order: usize,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let mut candidates: Vec<Vector3<f64>> = valid
        .iter()
        .map(|t| {
            let mut rep = t.map(|c| c - c.round());
            // Canonical sign: leading in-plane component positive.
            if rep[p] < -f64::EPSILON || (rep[p].abs() <= f64::EPSILON && rep[q] < 0.0) {
                rep = -rep;
            }
            rep
        })
        .collect();
    let mut unit_p = Vector3::zeros();
    unit_p[p] = 1.0;
    let mut unit_q = Vector3::zeros();
    unit_q[q] = 1.0;
    candidates.push(unit_p);
    candidates.push(unit_q);

    let length = |v: &Vector3<f64>| {
        lattice
            .fractional_to_cartesian(v)
            .coords
            .norm()
    };
    let target = 1.0 / order as f64;

    let mut best: Option<(f64, Vector3<f64>, Vector3<f64>)> = None;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let a = candidates[i];
            let b = candidates[j];
            let area = (a[p] * b[q] - a[q] * b[p]).abs();
            if (area - target).abs() > AREA_TOLERANCE {
                continue;
            }
            let combined = length(&a) + length(&b);
            if best
                .as_ref()
                .map(|(len, _, _)| combined < *len)
                .unwrap_or(true)
            {
                best = Some((combined, a, b));
            }
        }
    }
    best.map(|(_, a, b)| (a, b))
}

#[allow(clippy::too_many_arguments)]
fn reduce_with_basis(
    structure: &Structure,
    fracs: &[Vector3<f64>],
    stacking_axis: usize,
    p: usize,
    q: usize,
    v1: &Vector3<f64>,
    v2: &Vector3<f64>,
    order: usize,
) -> Option<Structure> {
    let old = structure.lattice.matrix();

    // Fractional transform: new basis rows expressed in the old basis.
    let mut transform = Matrix3::zeros();
    transform.set_row(p, &RowVector3::new(v1.x, v1.y, v1.z));
    transform.set_row(q, &RowVector3::new(v2.x, v2.y, v2.z));
    let mut stacking_row = RowVector3::zeros();
    stacking_row[stacking_axis] = 1.0;
    transform.set_row(stacking_axis, &stacking_row);

    let inverse = transform.try_inverse()?;
    let to_new = inverse.transpose();

    let mut rows = [RowVector3::zeros(); 3];
    rows[p] = (old.transpose() * v1).transpose();
    rows[q] = (old.transpose() * v2).transpose();
    rows[stacking_axis] = old.row(stacking_axis).into_owned();
    let new_lattice = Lattice::new(Matrix3::from_rows(&rows));

    let mut kept: Vec<Atom> = Vec::with_capacity(structure.len() / order);
    for (index, atom) in structure.atoms.iter().enumerate() {
        let mapped = wrap_frac(&(to_new * fracs[index]));
        let duplicate = kept.iter().any(|existing| {
            existing.species == atom.species
                && site_distance(&new_lattice, &existing.frac, &mapped) < SITE_MERGE_DISTANCE
        });
        if !duplicate {
            kept.push(Atom::new(&atom.species, mapped));
        }
    }

    if kept.len() != structure.len() / order {
        return None;
    }
    Some(Structure::new(new_lattice, kept))
}

/// Fully periodic Cartesian minimum-image distance used for site merging.
fn site_distance(lattice: &Lattice, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    use crate::core::utils::geometry::{PeriodicAxes, cartesian_separation};
    cartesian_separation(lattice, a, b, PeriodicAxes::all())
}
