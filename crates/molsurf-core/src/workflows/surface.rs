use crate::core::elements::RadiusTable;
use crate::core::mesh::cutter::{BoxCutter, CutOutcome, Cutter, ProximityCutter, SphereCutter};
use crate::core::mesh::texture::SurfaceTexture;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::Molecule;
use crate::core::surface::{Surface, SurfaceBuilder};
use crate::engine::config::{ClipRegion, SurfaceConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use nalgebra::Isometry3;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct SurfaceResult {
    pub surface: Surface,
    /// Outcome of the clip, `None` when no clip region was configured.
    pub clip: Option<CutOutcome>,
}

/// Builds, colours and clips the surface of `molecule` placed by `transform`.
#[instrument(skip_all, name = "surface_workflow", fields(molecule = molecule.name()))]
pub fn run(
    molecule: &Molecule,
    transform: &Isometry3<f64>,
    config: &SurfaceConfig,
    radii: &RadiusTable,
    reporter: &ProgressReporter,
) -> Result<SurfaceResult, EngineError> {
    reporter.stage_start("Surface construction");
    let atoms: Vec<Atom> = molecule
        .atoms()
        .iter()
        .filter(|atom| config.include_hydrogens || !atom.is_hydrogen())
        .map(|atom| Atom {
            position: transform * atom.position,
            ..*atom
        })
        .collect();
    info!(
        atoms = atoms.len(),
        kind = %config.surface.kind,
        probe = config.surface.probe_radius,
        "Building molecular surface."
    );
    let mut surface = SurfaceBuilder::new(config.surface, radii).build(&atoms)?;
    reporter.stage_finish();

    if let Some(mode) = config.color_mode {
        reporter.stage_start("Surface colouring");
        SurfaceTexture::new(&atoms, mode, config.texture_cutoff).apply(surface.mesh_mut());
        reporter.stage_finish();
    }

    let clip = match &config.clip {
        Some(region) => {
            reporter.stage_start("Surface clipping");
            let cutter = cutter_for(region);
            let outcome = cutter.cut(surface.mesh_mut());
            match outcome {
                CutOutcome::Partial => surface.mesh_mut().compute_normals(),
                CutOutcome::Removed => warn!("Clip region removed the entire surface."),
                CutOutcome::Unchanged => {}
            }
            reporter.stage_finish();
            Some(outcome)
        }
        None => None,
    };

    info!(
        points = surface.mesh().point_count(),
        triangles = surface.mesh().triangle_count(),
        "Surface workflow complete."
    );
    Ok(SurfaceResult { surface, clip })
}

fn cutter_for(region: &ClipRegion) -> Box<dyn Cutter> {
    match region {
        ClipRegion::Sphere { center, radius } => Box::new(SphereCutter::new(center.cast(), *radius as f32)),
        ClipRegion::Box { min, max } => Box::new(BoxCutter::new(min.cast(), max.cast())),
        ClipRegion::NearAtoms { centres, cutoff } => Box::new(ProximityCutter::new(centres, *cutoff)),
    }
}
