//! Molecular surface triangulation.
//!
//! Two surface definitions are supported:
//!
//! - **Lee-Richards** (solvent accessible): the boundary of the union of
//!   atom spheres inflated by the probe radius. Every point lies one probe
//!   radius away from the van der Waals surface.
//! - **Connolly** (solvent excluded): the surface swept by the inward face
//!   of a probe rolling over the van der Waals spheres. Crevices the probe
//!   cannot enter are filled in.
//!
//! Both are extracted as the zero set of a signed distance field sampled on
//! a regular grid. For Connolly surfaces the accessible surface is built
//! first; its vertices serve as probe centres and the field inside the
//! accessible shell is replaced by the distance to the nearest probe.

mod grid;
mod postprocess;
mod probe;
mod tetra;

pub use grid::MAX_GRID_POINTS;

use crate::core::elements::RadiusTable;
use crate::core::mesh::{Mesh, MeshError};
use crate::core::models::atom::Atom;
use grid::{DistanceGrid, Sphere};
use nalgebra::Point3;
use probe::ProbeIndex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Edges shorter than this fraction of the voxel are collapsed after extraction.
const WELD_FRACTION: f32 = 0.15;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Cannot build a surface without atoms")]
    EmptyInput,
    #[error("Probe radius must be finite and non-negative, got {0}")]
    InvalidProbeRadius(f64),
    #[error("Voxel size must be finite and positive, got {0}")]
    InvalidVoxelSize(f64),
    #[error("Surface grid of {dims:?} points exceeds the limit of {limit} samples")]
    GridTooLarge { dims: [usize; 3], limit: usize },
    #[error("Invalid mesh produced: {0}")]
    Mesh(#[from] MeshError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceKind {
    /// Solvent-excluded surface.
    #[default]
    Connolly,
    /// Solvent-accessible surface, offset from the atoms by the probe radius.
    LeeRichards,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown surface kind '{0}' (expected connolly or lee-richards)")]
pub struct ParseSurfaceKindError(String);

impl FromStr for SurfaceKind {
    type Err = ParseSurfaceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "connolly" | "ses" => Ok(Self::Connolly),
            "lee-richards" | "sas" => Ok(Self::LeeRichards),
            _ => Err(ParseSurfaceKindError(s.to_string())),
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connolly => "connolly",
            Self::LeeRichards => "lee-richards",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub kind: SurfaceKind,
    pub probe_radius: f64,
    pub voxel_size: f64,
    pub smoothing_iterations: usize,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            kind: SurfaceKind::Connolly,
            probe_radius: 1.4,
            voxel_size: 0.5,
            smoothing_iterations: 1,
        }
    }
}

impl SurfaceParams {
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if !self.probe_radius.is_finite() || self.probe_radius < 0.0 {
            return Err(SurfaceError::InvalidProbeRadius(self.probe_radius));
        }
        if !self.voxel_size.is_finite() || self.voxel_size <= 0.0 {
            return Err(SurfaceError::InvalidVoxelSize(self.voxel_size));
        }
        Ok(())
    }
}

/// A triangulated molecular surface.
#[derive(Debug, Clone)]
pub struct Surface {
    mesh: Mesh,
    kind: SurfaceKind,
    probe_radius: f64,
}

impl Surface {
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn probe_radius(&self) -> f64 {
        self.probe_radius
    }

    /// How far the surface sits outside the van der Waals spheres.
    pub fn surface_surplus(&self) -> f64 {
        match self.kind {
            SurfaceKind::Connolly => 0.0,
            SurfaceKind::LeeRichards => self.probe_radius,
        }
    }
}

pub struct SurfaceBuilder<'a> {
    params: SurfaceParams,
    radii: &'a RadiusTable,
}

impl<'a> SurfaceBuilder<'a> {
    pub fn new(params: SurfaceParams, radii: &'a RadiusTable) -> Self {
        Self { params, radii }
    }

    pub fn params(&self) -> &SurfaceParams {
        &self.params
    }

    #[instrument(skip_all, name = "surface_build", fields(kind = %self.params.kind))]
    pub fn build<'b, I>(&self, atoms: I) -> Result<Surface, SurfaceError>
    where
        I: IntoIterator<Item = &'b Atom>,
    {
        self.params.validate()?;
        let spheres: Vec<Sphere> = atoms
            .into_iter()
            .map(|atom| Sphere {
                center: atom.position.cast::<f32>(),
                radius: self.radii.radius(atom.atomic_number) as f32,
            })
            .collect();
        if spheres.is_empty() {
            return Err(SurfaceError::EmptyInput);
        }

        let probe = self.params.probe_radius as f32;
        let spacing = self.params.voxel_size as f32;
        let max_radius = spheres.iter().map(|s| s.radius).fold(0.0f32, f32::max);
        let padding = probe + max_radius + 3.0 * spacing;
        let limit = probe + 2.0 * spacing;

        let inflated: Vec<Sphere> = spheres
            .iter()
            .map(|s| Sphere {
                center: s.center,
                radius: s.radius + probe,
            })
            .collect();
        let mut grid = DistanceGrid::enclosing(&inflated, spacing, padding, limit)?;
        debug!(dims = ?grid.dims(), atoms = spheres.len(), "Sampling accessible distance field");
        grid.stamp(&inflated);

        if self.params.kind == SurfaceKind::Connolly && probe > 0.0 {
            exclude_probe_volume(&mut grid, probe);
        }

        let raw = tetra::extract(&grid);
        let mut raw = postprocess::weld(raw, WELD_FRACTION * spacing);
        postprocess::smooth(&mut raw, self.params.smoothing_iterations);

        let mut mesh = Mesh::from_parts(raw.points, raw.triangles)?;
        mesh.compute_normals();
        if tracing::enabled!(tracing::Level::DEBUG) {
            mesh.statistics().log("surface");
        }
        info!(
            points = mesh.point_count(),
            triangles = mesh.triangle_count(),
            "Surface built"
        );

        Ok(Surface {
            mesh,
            kind: self.params.kind,
            probe_radius: self.params.probe_radius,
        })
    }
}

/// Turns an accessible-surface field into an excluded-surface field.
///
/// Inside the accessible shell `[-probe, 0)` the value becomes
/// `probe - d`, with `d` the distance to the nearest probe centre placed on
/// the accessible surface; elsewhere the accessible value is shifted by
/// `probe` so both pieces meet at the shell boundaries.
fn exclude_probe_volume(grid: &mut DistanceGrid, probe: f32) {
    let spacing = grid.spacing();
    let accessible = postprocess::weld(tetra::extract(grid), WELD_FRACTION * spacing);
    let index = ProbeIndex::new(&accessible.points, probe + spacing);
    debug!(probes = accessible.points.len(), "Placed probe centres on accessible surface");
    if index.is_empty() {
        return;
    }

    grid.remap(|p: Point3<f32>, sas| {
        if sas >= 0.0 || sas < -probe {
            return probe + sas;
        }
        match index.nearest_within(&p, probe + spacing) {
            Some(d) => probe - d,
            None => -spacing,
        }
    });
}
