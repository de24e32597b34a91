//! # Core Module
//!
//! Stateless building blocks shared by both engines.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, molecules, ring perception
//! - **Element Data** ([`elements`]) - Periodic-table constants and the radius table
//! - **Triangle Meshes** ([`mesh`]) - Indexed mesh buffers, cutters and surface texture
//! - **Surface Extraction** ([`surface`]) - Distance-field stamping and isosurface meshing
//! - **Geometry Helpers** ([`utils`]) - Centroids, plane fitting, angles
//!
//! Nothing in this layer caches results across calls; callers own every
//! buffer that comes out of it.

pub mod elements;
pub mod mesh;
pub mod models;
pub mod surface;
pub mod utils;
