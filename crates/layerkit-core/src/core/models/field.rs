use super::structure::Structure;
use nalgebra::Vector3;
use thiserror::Error;

/// Error raised when a grid's declared dimensions disagree with its value
/// count.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("grid of {nx}x{ny}x{nz} points requires {expected} values, got {actual}")]
pub struct GridSizeMismatch {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub expected: usize,
    pub actual: usize,
}

/// Represents a dense 3D scalar field sampled over a crystal cell.
///
/// Values are stored flat with the first grid axis fastest, matching the
/// reading order of the volumetric file format: the point `(i, j, k)` lives at
/// flat index `i + nx * (j + ny * k)`. The field shares its lattice with the
/// associated structure, whose atoms are used for nearest-neighbor lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    structure: Structure,
    dims: [usize; 3],
    values: Vec<f64>,
}

impl ScalarField {
    /// Creates a scalar field from a structure, grid dimensions, and a flat
    /// value array in first-axis-fastest order.
    ///
    /// # Errors
    ///
    /// Returns [`GridSizeMismatch`] if `values.len()` differs from the product
    /// of the dimensions.
    pub fn new(
        structure: Structure,
        dims: [usize; 3],
        values: Vec<f64>,
    ) -> Result<Self, GridSizeMismatch> {
        let expected = dims[0] * dims[1] * dims[2];
        if values.len() != expected {
            return Err(GridSizeMismatch {
                nx: dims[0],
                ny: dims[1],
                nz: dims[2],
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            structure,
            dims,
            values,
        })
    }

    /// Returns the structure sharing this field's lattice.
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Returns the grid dimensions `(nx, ny, nz)`.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Returns the total number of grid points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the grid has no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the flat value array in first-axis-fastest order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the value at grid point `(i, j, k)`.
    pub fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[i + self.dims[0] * (j + self.dims[1] * k)]
    }

    /// Returns the grid point `(i, j, k)` for a flat index.
    pub fn grid_point(&self, flat: usize) -> [usize; 3] {
        let i = flat % self.dims[0];
        let j = (flat / self.dims[0]) % self.dims[1];
        let k = flat / (self.dims[0] * self.dims[1]);
        [i, j, k]
    }

    /// Maps a grid point to its fractional coordinate, `index / dimension`
    /// per axis.
    pub fn index_to_frac(&self, point: [usize; 3]) -> Vector3<f64> {
        Vector3::new(
            point[0] as f64 / self.dims[0] as f64,
            point[1] as f64 / self.dims[1] as f64,
            point[2] as f64 / self.dims[2] as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::lattice::Lattice;

    fn empty_structure() -> Structure {
        Structure::new(Lattice::orthorhombic(1.0, 1.0, 1.0), Vec::new())
    }

    #[test]
    fn new_rejects_size_mismatch() {
        let err = ScalarField::new(empty_structure(), [2, 2, 2], vec![0.0; 7]).unwrap_err();
        assert_eq!(err.expected, 8);
        assert_eq!(err.actual, 7);
    }

    #[test]
    fn value_uses_first_axis_fastest_layout() {
        let values: Vec<f64> = (0..8).map(|v| v as f64).collect();
        let field = ScalarField::new(empty_structure(), [2, 2, 2], values).unwrap();
        assert_eq!(field.value(1, 0, 0), 1.0);
        assert_eq!(field.value(0, 1, 0), 2.0);
        assert_eq!(field.value(0, 0, 1), 4.0);
        assert_eq!(field.value(1, 1, 1), 7.0);
    }

    #[test]
    fn grid_point_inverts_flat_indexing() {
        let field = ScalarField::new(empty_structure(), [3, 4, 5], vec![0.0; 60]).unwrap();
        for flat in [0, 1, 3, 17, 59] {
            let [i, j, k] = field.grid_point(flat);
            assert_eq!(flat, i + 3 * (j + 4 * k));
        }
    }

    #[test]
    fn index_to_frac_divides_by_dimension() {
        let field = ScalarField::new(empty_structure(), [4, 4, 4], vec![0.0; 64]).unwrap();
        let frac = field.index_to_frac([1, 2, 3]);
        assert_eq!(frac, Vector3::new(0.25, 0.5, 0.75));
    }
}
