use crate::cli::SurfaceArgs;
use crate::config::PartialSurfaceConfig;
use crate::error::{CliError, Result};
use crate::export;
use crate::scene_file::SceneFile;
use crate::utils::progress::CliProgressHandler;
use molsurf::core::elements::RadiusTable;
use molsurf::core::mesh::cutter::CutOutcome;
use molsurf::engine::config::InteractionCriteria;
use molsurf::engine::error::EngineError;
use molsurf::engine::progress::ProgressReporter;
use molsurf::workflows;
use std::fs::File;
use std::io::BufWriter;
use tracing::{info, warn};

pub fn run(args: SurfaceArgs, progress: &CliProgressHandler) -> Result<()> {
    info!("Loading scene from {:?}", &args.scene);
    let scene = SceneFile::from_file(&args.scene)?.into_scene(InteractionCriteria::default())?;

    let id = scene
        .find_molecule(&args.molecule)
        .ok_or_else(|| CliError::Scene(format!("no molecule named '{}'", args.molecule)))?;

    let partial_config = match &args.config {
        Some(path) => PartialSurfaceConfig::from_file(path)?,
        None => PartialSurfaceConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, &scene)?;

    let molecule = scene
        .molecule(id)
        .ok_or(EngineError::MoleculeNotFound(id))?;
    let transform = scene.transform(id)?;
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    println!("Building {} surface of '{}'...", config.surface.kind, molecule.name());
    let result = workflows::surface::run(molecule, transform, &config, &RadiusTable::default(), &reporter)?;

    let mesh = result.surface.mesh();
    match result.clip {
        Some(CutOutcome::Removed) => {
            warn!("Clipping removed the whole surface.");
            println!("Warning: the clip region does not intersect the surface.");
        }
        Some(outcome) => info!(code = outcome.code(), "Clip applied."),
        None => {}
    }

    let stats = mesh.statistics();
    stats.log(molecule.name());
    println!(
        "✓ {} vertices, {} triangles, area {:.2} Å², surplus {:.2} Å",
        mesh.point_count(),
        mesh.triangle_count(),
        stats.total_area,
        result.surface.surface_surplus()
    );

    if let Some(path) = &args.output {
        let writer = BufWriter::new(File::create(path)?);
        export::write_mesh_json(mesh, writer)?;
        println!("✓ Mesh written to: {}", path.display());
    }

    Ok(())
}
