//! Which pairs of molecules are checked for interactions.

use crate::core::models::ids::GroupId;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoleculeRole {
    #[default]
    Ligand,
    Macromolecule,
    Cofactor,
    Solvent,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown molecule role '{0}' (expected ligand, macromolecule, cofactor or solvent)")]
pub struct ParseMoleculeRoleError(String);

impl FromStr for MoleculeRole {
    type Err = ParseMoleculeRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ligand" => Ok(Self::Ligand),
            "macromolecule" | "protein" => Ok(Self::Macromolecule),
            "cofactor" => Ok(Self::Cofactor),
            "solvent" | "water" => Ok(Self::Solvent),
            _ => Err(ParseMoleculeRoleError(s.to_string())),
        }
    }
}

impl fmt::Display for MoleculeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ligand => "ligand",
            Self::Macromolecule => "macromolecule",
            Self::Cofactor => "cofactor",
            Self::Solvent => "solvent",
        })
    }
}

/// What the eligibility rules need to know about one side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairMember {
    pub role: MoleculeRole,
    pub tag: i32,
    pub group: GroupId,
}

/// Role rules, applied in order:
///
/// 1. solvent with solvent is eligible;
/// 2. two molecules with the same role are not;
/// 3. a macromolecule or cofactor pairs with anything;
/// 4. a ligand pairs with solvent only when their tags match.
pub fn roles_eligible(a: MoleculeRole, a_tag: i32, b: MoleculeRole, b_tag: i32) -> bool {
    use MoleculeRole::*;
    if a == Solvent && b == Solvent {
        return true;
    }
    if a == b {
        return false;
    }
    if matches!(a, Macromolecule | Cofactor) || matches!(b, Macromolecule | Cofactor) {
        return true;
    }
    a_tag == b_tag
}

/// Full eligibility check including group membership. A molecule paired
/// with itself is only checked when it is solvent (water networks).
pub fn is_eligible(a: &PairMember, b: &PairMember, same_molecule: bool) -> bool {
    if a.group != b.group {
        return false;
    }
    if same_molecule {
        return a.role == MoleculeRole::Solvent;
    }
    roles_eligible(a.role, a.tag, b.role, b.tag)
}
