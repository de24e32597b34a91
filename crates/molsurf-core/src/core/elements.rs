//! Periodic-table constants used by the surface and interaction engines.
//!
//! Only immutable data lives here. Anything a caller may want to tune per
//! session (such as the radii used for surface generation) is wrapped in an
//! explicitly constructed table, see [`RadiusTable`].

use phf::{Map, phf_map};
use std::collections::HashMap;

pub const HYDROGEN: u8 = 1;
pub const CARBON: u8 = 6;
pub const NITROGEN: u8 = 7;
pub const OXYGEN: u8 = 8;
pub const FLUORINE: u8 = 9;
pub const PHOSPHORUS: u8 = 15;
pub const SULFUR: u8 = 16;
pub const CHLORINE: u8 = 17;
pub const SELENIUM: u8 = 34;
pub const BROMINE: u8 = 35;
pub const IODINE: u8 = 53;

/// Radius used for elements missing from the table.
pub const DEFAULT_VDW_RADIUS: f64 = 1.8;

const DEFAULT_COLOR: [f32; 3] = [0.87, 0.4, 0.87];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub symbol: &'static str,
    /// Bondi van der Waals radius in Angstroms.
    pub vdw_radius: f64,
    /// CPK-style display color.
    pub color: [f32; 3],
}

static ELEMENTS: Map<u8, ElementData> = phf_map! {
    1u8 => ElementData { symbol: "H", vdw_radius: 1.20, color: [1.0, 1.0, 1.0] },
    2u8 => ElementData { symbol: "He", vdw_radius: 1.40, color: [0.85, 1.0, 1.0] },
    3u8 => ElementData { symbol: "Li", vdw_radius: 1.82, color: [0.8, 0.5, 1.0] },
    5u8 => ElementData { symbol: "B", vdw_radius: 1.92, color: [1.0, 0.71, 0.71] },
    6u8 => ElementData { symbol: "C", vdw_radius: 1.70, color: [0.56, 0.56, 0.56] },
    7u8 => ElementData { symbol: "N", vdw_radius: 1.55, color: [0.19, 0.31, 0.97] },
    8u8 => ElementData { symbol: "O", vdw_radius: 1.52, color: [1.0, 0.05, 0.05] },
    9u8 => ElementData { symbol: "F", vdw_radius: 1.47, color: [0.56, 0.88, 0.31] },
    11u8 => ElementData { symbol: "Na", vdw_radius: 2.27, color: [0.67, 0.36, 0.95] },
    12u8 => ElementData { symbol: "Mg", vdw_radius: 1.73, color: [0.54, 1.0, 0.0] },
    14u8 => ElementData { symbol: "Si", vdw_radius: 2.10, color: [0.94, 0.78, 0.63] },
    15u8 => ElementData { symbol: "P", vdw_radius: 1.80, color: [1.0, 0.5, 0.0] },
    16u8 => ElementData { symbol: "S", vdw_radius: 1.80, color: [1.0, 1.0, 0.19] },
    17u8 => ElementData { symbol: "Cl", vdw_radius: 1.75, color: [0.12, 0.94, 0.12] },
    19u8 => ElementData { symbol: "K", vdw_radius: 2.75, color: [0.56, 0.25, 0.83] },
    20u8 => ElementData { symbol: "Ca", vdw_radius: 2.31, color: [0.24, 1.0, 0.0] },
    25u8 => ElementData { symbol: "Mn", vdw_radius: 2.05, color: [0.61, 0.48, 0.78] },
    26u8 => ElementData { symbol: "Fe", vdw_radius: 2.04, color: [0.88, 0.4, 0.2] },
    27u8 => ElementData { symbol: "Co", vdw_radius: 2.00, color: [0.94, 0.56, 0.63] },
    28u8 => ElementData { symbol: "Ni", vdw_radius: 1.63, color: [0.31, 0.82, 0.31] },
    29u8 => ElementData { symbol: "Cu", vdw_radius: 1.40, color: [0.78, 0.5, 0.2] },
    30u8 => ElementData { symbol: "Zn", vdw_radius: 1.39, color: [0.49, 0.5, 0.69] },
    34u8 => ElementData { symbol: "Se", vdw_radius: 1.90, color: [1.0, 0.63, 0.0] },
    35u8 => ElementData { symbol: "Br", vdw_radius: 1.85, color: [0.65, 0.16, 0.16] },
    53u8 => ElementData { symbol: "I", vdw_radius: 1.98, color: [0.58, 0.0, 0.58] },
};

static SYMBOLS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "D" => 1, "HE" => 2, "LI" => 3, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "NA" => 11, "MG" => 12, "SI" => 14, "P" => 15, "S" => 16, "CL" => 17,
    "K" => 19, "CA" => 20, "MN" => 25, "FE" => 26, "CO" => 27, "NI" => 28, "CU" => 29,
    "ZN" => 30, "SE" => 34, "BR" => 35, "I" => 53,
};

pub fn element(atomic_number: u8) -> Option<&'static ElementData> {
    ELEMENTS.get(&atomic_number)
}

pub fn symbol(atomic_number: u8) -> Option<&'static str> {
    element(atomic_number).map(|e| e.symbol)
}

/// Case-insensitive lookup of an element symbol.
pub fn atomic_number(symbol: &str) -> Option<u8> {
    SYMBOLS.get(symbol.trim().to_ascii_uppercase().as_str()).copied()
}

pub fn color(atomic_number: u8) -> [f32; 3] {
    element(atomic_number).map_or(DEFAULT_COLOR, |e| e.color)
}

/// Nitrogen, oxygen and sulfur are treated as polar heteroatoms.
pub fn is_polar_heteroatom(atomic_number: u8) -> bool {
    matches!(atomic_number, NITROGEN | OXYGEN | SULFUR)
}

/// Van der Waals radii used for surface construction.
///
/// Starts from the Bondi radii of the element table; individual elements can
/// be overridden. Built once by the caller and passed to the surface builder.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusTable {
    overrides: HashMap<u8, f64>,
    fallback: f64,
}

impl Default for RadiusTable {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            fallback: DEFAULT_VDW_RADIUS,
        }
    }
}

impl RadiusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_radius(mut self, atomic_number: u8, radius: f64) -> Self {
        self.overrides.insert(atomic_number, radius);
        self
    }

    pub fn with_fallback(mut self, radius: f64) -> Self {
        self.fallback = radius;
        self
    }

    pub fn radius(&self, atomic_number: u8) -> f64 {
        if let Some(&r) = self.overrides.get(&atomic_number) {
            return r;
        }
        element(atomic_number).map_or(self.fallback, |e| e.vdw_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup_is_case_insensitive() {
        assert_eq!(atomic_number("c"), Some(CARBON));
        assert_eq!(atomic_number("Cl"), Some(CHLORINE));
        assert_eq!(atomic_number(" BR "), Some(BROMINE));
        assert_eq!(atomic_number("Xx"), None);
    }

    #[test]
    fn symbols_round_trip_through_the_table() {
        for z in [HYDROGEN, CARBON, NITROGEN, OXYGEN, SULFUR, IODINE] {
            let sym = symbol(z).unwrap();
            assert_eq!(atomic_number(sym), Some(z));
        }
    }

    #[test]
    fn radius_table_prefers_overrides_then_bondi_then_fallback() {
        let table = RadiusTable::new().with_radius(CARBON, 2.0).with_fallback(1.5);
        assert_eq!(table.radius(CARBON), 2.0);
        assert_eq!(table.radius(OXYGEN), 1.52);
        assert_eq!(table.radius(92), 1.5);
    }

    #[test]
    fn unknown_elements_get_default_color() {
        assert_eq!(color(92), DEFAULT_COLOR);
        assert_eq!(color(OXYGEN), [1.0, 0.05, 0.05]);
    }
}
