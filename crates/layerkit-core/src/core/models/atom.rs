use nalgebra::Vector3;

/// Represents an atom in a crystal structure.
///
/// Atoms carry a species label and a fractional coordinate in the lattice
/// basis. Coordinates are conventionally in `[0, 1)` but are not wrapped on
/// input; analysis code wraps them where periodicity requires it. Atoms are
/// immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The species label (e.g. "Fe", "Mo").
    pub species: String,
    /// The fractional coordinate in the lattice basis.
    pub frac: Vector3<f64>,
}

impl Atom {
    /// Creates a new `Atom` with the given species label and fractional
    /// coordinate.
    pub fn new(species: &str, frac: Vector3<f64>) -> Self {
        Self {
            species: species.to_string(),
            frac,
        }
    }
}
