//! # molsurf Core Library
//!
//! Geometric engines for molecular visualisation back-ends: triangulated
//! molecular surfaces with volume clipping, and detection of non-covalent
//! interactions between molecules.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that pure geometry, cached
//! state and user-facing procedures stay separate.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Atom`,
//!   `Bond`), periodic-table data, the `Mesh` buffer type, isosurface
//!   extraction, mesh cutters and surface texturing.
//!
//! - **[`engine`]: The Logic Core.** Interaction sites and their per-molecule
//!   cache, the pairwise classifier, redundancy resolution, pair eligibility,
//!   configuration, progress reporting and error types.
//!
//! - **[`workflows`]: The Public API.** Entry points that tie the layers
//!   together: building a coloured, clipped surface for a molecule, and the
//!   `Scene` that keeps interaction sets between molecules up to date.

pub mod core;
pub mod engine;
pub mod workflows;
