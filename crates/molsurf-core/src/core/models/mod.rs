//! # Core Models Module
//!
//! Plain data structures describing molecules as the engines consume them:
//! atoms with element, formal charge and coordinates, bonds with orders, and
//! cached topology annotations (rings and aromaticity).
//!
//! - [`atom`] - Individual atoms
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - Atom/bond container with ring perception and fragment labelling
//! - [`ids`] - Handles for molecules and groups held in a scene registry
//!
//! ```ignore
//! use molsurf::core::models::{atom::Atom, molecule::Molecule, topology::BondOrder};
//!
//! let mut mol = Molecule::new("methanol");
//! let c = mol.add_atom(Atom::new(6, Point3::origin()));
//! let o = mol.add_atom(Atom::new(8, Point3::new(1.43, 0.0, 0.0)));
//! mol.add_bond(c, o, BondOrder::Single)?;
//! mol.perceive_rings();
//! ```

pub mod atom;
pub mod ids;
pub mod molecule;
pub mod topology;
