use crate::cli::InteractionsArgs;
use crate::error::Result;
use crate::export;
use crate::scene_file::SceneFile;
use crate::utils::progress::CliProgressHandler;
use itertools::Itertools;
use molsurf::core::models::ids::MoleculeId;
use molsurf::engine::classify::InteractionSet;
use molsurf::engine::config::InteractionCriteria;
use molsurf::engine::progress::ProgressReporter;
use molsurf::workflows::scene::Scene;
use std::fs::File;
use std::io::BufWriter;
use tracing::{debug, info, warn};

pub fn run(args: InteractionsArgs, progress: &CliProgressHandler) -> Result<()> {
    let criteria = match &args.criteria {
        Some(path) => {
            info!("Loading interaction criteria from {:?}", path);
            InteractionCriteria::load(path)?
        }
        None => {
            debug!(model = %args.model, "Using preset interaction criteria");
            args.model.criteria()
        }
    };

    info!("Loading scene from {:?}", &args.scene);
    let mut scene = SceneFile::from_file(&args.scene)?.into_scene(criteria)?;

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    println!("Detecting interactions...");
    let summary = scene.recompute(&reporter)?;
    info!(
        eligible = summary.eligible_pairs,
        recomputed = summary.recomputed_pairs,
        interactions = summary.interactions,
        "Interaction detection finished."
    );

    let pairs: Vec<(MoleculeId, MoleculeId, &InteractionSet)> = if args.visible_only {
        scene.visible_interactions().collect()
    } else {
        scene.all_interactions().collect()
    };

    if pairs.iter().all(|(_, _, set)| set.is_empty()) {
        warn!("No interactions found between eligible pairs.");
        println!("No interactions found ({} eligible pairs).", summary.eligible_pairs);
    } else {
        for (a, b, set) in pairs.iter().filter(|(_, _, set)| !set.is_empty()) {
            println!("  {}", describe_pair(&scene, *a, *b, set));
        }
    }

    if let Some(path) = &args.csv {
        let writer = BufWriter::new(File::create(path)?);
        let rows = export::write_interactions_csv(&scene, pairs.iter().copied(), writer)?;
        println!("✓ {} interaction(s) written to: {}", rows, path.display());
    }

    Ok(())
}

fn describe_pair(scene: &Scene, a: MoleculeId, b: MoleculeId, set: &InteractionSet) -> String {
    let name = |id| scene.molecule(id).map(|m| m.name()).unwrap_or("?");
    let counts = set
        .iter()
        .map(|(kind, list)| format!("{} {}", list.len(), kind))
        .join(", ");
    format!("{} <-> {}: {}", name(a), name(b), counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use clap::Parser;
    use std::path::Path;

    const SCENE: &str = r#"
        [[molecules]]
        name = "host"
        role = "macromolecule"
        atoms = [{ element = "C", position = [0.0, 0.0, 0.0] }]

        [[molecules]]
        name = "guest"
        role = "ligand"
        visible = false
        atoms = [{ element = "C", position = [3.0, 0.0, 0.0] }]
    "#;

    fn args_for(dir: &Path, extra: &[&str]) -> InteractionsArgs {
        let scene = dir.join("scene.toml");
        std::fs::write(&scene, SCENE).unwrap();
        let scene = scene.to_string_lossy().to_string();
        let mut argv = vec!["molsurf", "interactions", "-s", scene.as_str()];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Interactions(args) => args,
            _ => panic!("Expected 'interactions' subcommand"),
        }
    }

    fn csv_rows(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().skip(1).count()
    }

    #[test]
    fn writes_one_row_per_contact() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("out.csv");
        let csv_arg = csv.to_string_lossy().to_string();
        run(args_for(dir.path(), &["--csv", csv_arg.as_str()]), &CliProgressHandler::hidden()).unwrap();
        assert_eq!(csv_rows(&csv), 1);
    }

    #[test]
    fn visible_only_hides_pairs_with_hidden_molecules() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("out.csv");
        let csv_arg = csv.to_string_lossy().to_string();
        let args = args_for(dir.path(), &["--visible-only", "--csv", csv_arg.as_str()]);
        run(args, &CliProgressHandler::hidden()).unwrap();
        assert_eq!(csv_rows(&csv), 0);
    }

    #[test]
    fn custom_criteria_file_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let criteria = dir.path().join("criteria.toml");
        std::fs::write(&criteria, "hydrophobic-max-distance = 2.5\n").unwrap();
        let csv = dir.path().join("out.csv");
        let (criteria_arg, csv_arg) = (
            criteria.to_string_lossy().to_string(),
            csv.to_string_lossy().to_string(),
        );
        let args = args_for(dir.path(), &["--criteria", criteria_arg.as_str(), "--csv", csv_arg.as_str()]);
        run(args, &CliProgressHandler::hidden()).unwrap();
        assert_eq!(csv_rows(&csv), 0);
    }

    #[test]
    fn missing_criteria_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_for(dir.path(), &["--criteria", "/nonexistent/criteria.toml"]);
        let result = run(args, &CliProgressHandler::hidden());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
