use crate::core::elements;
use nalgebra::Point3;

/// A single atom of a [`Molecule`](super::molecule::Molecule).
///
/// Atoms are addressed by their index inside the owning molecule; that index
/// space stays stable for the duration of a computation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atomic number (1 for hydrogen, 6 for carbon, ...).
    pub atomic_number: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Molecule-local coordinates in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(atomic_number: u8, position: Point3<f64>) -> Self {
        Self {
            atomic_number,
            formal_charge: 0,
            position,
        }
    }

    pub fn with_charge(mut self, formal_charge: i8) -> Self {
        self.formal_charge = formal_charge;
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == elements::HYDROGEN
    }

    pub fn is_halogen(&self) -> bool {
        matches!(
            self.atomic_number,
            elements::FLUORINE | elements::CHLORINE | elements::BROMINE | elements::IODINE
        )
    }

    /// Element symbol, or `"?"` for elements outside the built-in table.
    pub fn symbol(&self) -> &'static str {
        elements::symbol(self.atomic_number).unwrap_or("?")
    }
}
