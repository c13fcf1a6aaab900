use super::atom::Atom;
use super::lattice::Lattice;
use nalgebra::Point3;

/// Represents a crystal structure: a lattice plus an ordered sequence of
/// atoms.
///
/// A structure is constructed once per input file and is read-only afterward.
/// Every analysis run derives its own values from it; there is no shared
/// mutable state between invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    /// The lattice defining the periodic cell.
    pub lattice: Lattice,
    /// The atoms of the cell, in input order.
    pub atoms: Vec<Atom>,
}

impl Structure {
    /// Creates a new `Structure` from a lattice and an atom list.
    pub fn new(lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Self { lattice, atoms }
    }

    /// Returns the number of atoms in the cell.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Returns `true` if the cell contains no atoms.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Returns the Cartesian position of the atom at `index`.
    pub fn cartesian_position(&self, index: usize) -> Point3<f64> {
        self.lattice.fractional_to_cartesian(&self.atoms[index].frac)
    }

    /// Returns the Cartesian positions of all atoms, in atom order.
    pub fn cartesian_positions(&self) -> Vec<Point3<f64>> {
        self.atoms
            .iter()
            .map(|atom| self.lattice.fractional_to_cartesian(&atom.frac))
            .collect()
    }
}
