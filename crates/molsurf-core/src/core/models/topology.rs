use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Triple => "Triple",
            Self::Aromatic => "Aromatic",
        };
        f.write_str(name)
    }
}

/// A covalent bond between two atom indices of the same molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// The partner of `atom` in this bond, if `atom` is one of its ends.
    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }

    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.atom1 == a && self.atom2 == b) || (self.atom1 == b && self.atom2 == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_parses_common_spellings() {
        assert_eq!(BondOrder::from_str("1").unwrap(), BondOrder::Single);
        assert_eq!(BondOrder::from_str("D").unwrap(), BondOrder::Double);
        assert_eq!(BondOrder::from_str("triple").unwrap(), BondOrder::Triple);
        assert_eq!(BondOrder::from_str("ar").unwrap(), BondOrder::Aromatic);
        assert!(BondOrder::from_str("quadruple").is_err());
    }

    #[test]
    fn bond_order_display_matches_variant_names() {
        assert_eq!(BondOrder::Aromatic.to_string(), "Aromatic");
        assert_eq!(BondOrder::default().to_string(), "Single");
    }

    #[test]
    fn bond_other_returns_partner_only_for_members() {
        let bond = Bond::new(3, 7, BondOrder::Double);
        assert_eq!(bond.other(3), Some(7));
        assert_eq!(bond.other(7), Some(3));
        assert_eq!(bond.other(4), None);
        assert!(bond.contains(7));
        assert!(bond.connects(7, 3));
        assert!(!bond.connects(3, 4));
    }
}
