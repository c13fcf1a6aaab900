use nalgebra::{Matrix3, Point3, RowVector3, Vector3};

/// Relative tolerance used when comparing basis-vector lengths for the
/// stacking-axis choice. Ties resolve toward the highest axis index so that
/// cubic cells stack along the conventional c direction.
const AXIS_TIE_TOLERANCE: f64 = 1e-8;

/// Represents a crystal lattice as a 3x3 matrix of real basis vectors.
///
/// The basis vectors are stored row-major in Angstroms: row 0 is the a vector,
/// row 1 the b vector, and row 2 the c vector. A fractional coordinate `f`
/// maps to a Cartesian point via `f * M` (row-vector convention).
///
/// The lattice is a plain value object; degeneracy (a vanishing cell volume)
/// is not rejected at construction but is surfaced by the analysis engine at
/// its entry points.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Lattice {
    /// Creates a lattice from a row-major basis matrix.
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Creates a lattice from the three basis vectors.
    pub fn from_vectors(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix3::from_rows(&[
                RowVector3::new(a.x, a.y, a.z),
                RowVector3::new(b.x, b.y, b.z),
                RowVector3::new(c.x, c.y, c.z),
            ]),
        }
    }

    /// Creates an orthorhombic lattice with the given edge lengths.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self {
            matrix: Matrix3::from_diagonal(&Vector3::new(a, b, c)),
        }
    }

    /// Returns the row-major basis matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Returns the basis vector for the given axis (0, 1, or 2).
    pub fn basis_vector(&self, axis: usize) -> Vector3<f64> {
        self.matrix.row(axis).transpose()
    }

    /// Returns the lengths of the three basis vectors in Angstroms.
    pub fn lengths(&self) -> [f64; 3] {
        [
            self.basis_vector(0).norm(),
            self.basis_vector(1).norm(),
            self.basis_vector(2).norm(),
        ]
    }

    /// Returns the signed determinant of the basis matrix.
    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// Returns the cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.determinant().abs()
    }

    /// Converts a fractional coordinate to a Cartesian point.
    pub fn fractional_to_cartesian(&self, frac: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.matrix.transpose() * frac)
    }

    /// Converts a Cartesian point to a fractional coordinate.
    ///
    /// Returns `None` if the basis matrix is not invertible (degenerate cell).
    pub fn cartesian_to_fractional(&self, cart: &Point3<f64>) -> Option<Vector3<f64>> {
        self.matrix
            .transpose()
            .try_inverse()
            .map(|inv| inv * cart.coords)
    }

    /// Returns the index of the stacking axis: the longest basis vector, with
    /// length ties resolved toward the highest axis index.
    ///
    /// In layered structures the stacking axis carries the vacuum padding and
    /// is therefore the longest cell vector.
    pub fn stacking_axis(&self) -> usize {
        let lengths = self.lengths();
        let mut best = 0;
        for axis in 1..3 {
            if lengths[axis] + AXIS_TIE_TOLERANCE >= lengths[best] {
                best = axis;
            }
        }
        best
    }

    /// Returns the unit normal of the plane spanned by the two non-stacking
    /// basis vectors, or `None` if they are collinear.
    pub fn plane_normal(&self, stacking_axis: usize) -> Option<Vector3<f64>> {
        let (p, q) = in_plane_axes(stacking_axis);
        let normal = self.basis_vector(p).cross(&self.basis_vector(q));
        let norm = normal.norm();
        if norm <= f64::EPSILON {
            None
        } else {
            Some(normal / norm)
        }
    }
}

/// Returns the two axis indices orthogonal to the given stacking axis, in
/// ascending order.
pub fn in_plane_axes(stacking_axis: usize) -> (usize, usize) {
    match stacking_axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_to_cartesian_is_a_basis_combination() {
        let lattice = Lattice::orthorhombic(2.0, 3.0, 4.0);
        let cart = lattice.fractional_to_cartesian(&Vector3::new(0.5, 0.5, 0.25));
        assert_eq!(cart, Point3::new(1.0, 1.5, 1.0));
    }

    #[test]
    fn fractional_to_cartesian_handles_skewed_cells() {
        let lattice = Lattice::from_vectors(
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 10.0),
        );
        let cart = lattice.fractional_to_cartesian(&Vector3::new(0.5, 0.5, 0.0));
        assert!((cart.x - 1.5).abs() < 1e-12);
        assert!((cart.y - 1.0).abs() < 1e-12);
        assert!((cart.z - 0.0).abs() < 1e-12);
    }

    #[test]
    fn cartesian_round_trips_through_fractional() {
        let lattice = Lattice::from_vectors(
            Vector3::new(3.1, 0.0, 0.0),
            Vector3::new(-1.55, 2.68, 0.0),
            Vector3::new(0.0, 0.0, 20.0),
        );
        let frac = Vector3::new(0.3, 0.7, 0.55);
        let cart = lattice.fractional_to_cartesian(&frac);
        let back = lattice.cartesian_to_fractional(&cart).unwrap();
        assert!((back - frac).norm() < 1e-12);
    }

    #[test]
    fn cartesian_to_fractional_fails_for_degenerate_cell() {
        let lattice = Lattice::from_vectors(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert!(
            lattice
                .cartesian_to_fractional(&Point3::new(1.0, 1.0, 1.0))
                .is_none()
        );
        assert!(lattice.volume() < 1e-12);
    }

    #[test]
    fn stacking_axis_picks_longest_vector() {
        let lattice = Lattice::orthorhombic(3.0, 3.0, 20.0);
        assert_eq!(lattice.stacking_axis(), 2);

        let lattice = Lattice::orthorhombic(25.0, 3.0, 3.0);
        assert_eq!(lattice.stacking_axis(), 0);
    }

    #[test]
    fn stacking_axis_tie_resolves_to_c() {
        let cube = Lattice::orthorhombic(3.0, 3.0, 3.0);
        assert_eq!(cube.stacking_axis(), 2);
    }

    #[test]
    fn plane_normal_is_orthogonal_to_in_plane_vectors() {
        let lattice = Lattice::from_vectors(
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(-1.5, 2.598, 0.0),
            Vector3::new(0.0, 0.0, 18.0),
        );
        let normal = lattice.plane_normal(2).unwrap();
        assert!(normal.dot(&lattice.basis_vector(0)).abs() < 1e-9);
        assert!(normal.dot(&lattice.basis_vector(1)).abs() < 1e-9);
        assert!((normal.norm() - 1.0).abs() < 1e-12);
    }
}
