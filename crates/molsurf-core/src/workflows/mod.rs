//! # Workflows Module
//!
//! Top-level entry points that combine the geometry of [`crate::core`] with
//! the interaction engine of [`crate::engine`].
//!
//! - **Surface Workflow** ([`surface`]) - Builds the molecular surface of one
//!   molecule, colours it by a per-atom property and clips it to a region.
//! - **Scene** ([`scene`]) - Holds molecules in groups with roles, tags,
//!   transforms and visibility, and keeps the interaction sets between
//!   eligible pairs current with incremental recomputation.

pub mod scene;
pub mod surface;
