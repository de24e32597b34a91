use crate::cli::{ClipArgs, SurfaceArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use molsurf::core::mesh::texture::ColorMode;
use molsurf::core::surface::SurfaceKind;
use molsurf::engine::config::{self as core_config, ClipRegion};
use molsurf::workflows::scene::Scene;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_PROXIMITY_CUTOFF: f64 = 5.0;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSurfaceSection {
    kind: Option<SurfaceKind>,
    probe_radius: Option<f64>,
    voxel_size: Option<f64>,
    smoothing_iterations: Option<usize>,
    include_hydrogens: Option<bool>,
    color: Option<ColorMode>,
    texture_cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
enum PartialClipRegion {
    Sphere { center: [f64; 3], radius: f64 },
    Box { min: [f64; 3], max: [f64; 3] },
    NearMolecule { molecule: String, cutoff: Option<f64> },
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSurfaceConfig {
    #[serde(default)]
    surface: PartialSurfaceSection,
    clip: Option<PartialClipRegion>,
}

impl PartialSurfaceConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading surface configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Command-line values win over file values; unset values fall back to
    /// the core defaults.
    pub fn merge_with_cli(self, args: &SurfaceArgs, scene: &Scene) -> Result<core_config::SurfaceConfig> {
        let file = self.surface;
        let mut builder = core_config::SurfaceConfigBuilder::new()
            .kind(args.kind.or(file.kind).unwrap_or_default())
            .include_hydrogens(args.hydrogens || file.include_hydrogens.unwrap_or(false));

        if let Some(radius) = args.probe_radius.or(file.probe_radius) {
            builder = builder.probe_radius(radius);
        }
        if let Some(size) = args.voxel_size.or(file.voxel_size) {
            builder = builder.voxel_size(size);
        }
        if let Some(iterations) = args.smoothing.or(file.smoothing_iterations) {
            builder = builder.smoothing_iterations(iterations);
        }
        if let Some(mode) = args.color_mode.or(file.color) {
            builder = builder.color_mode(mode);
        }
        if let Some(cutoff) = file.texture_cutoff {
            builder = builder.texture_cutoff(cutoff);
        }

        let clip = match clip_from_args(&args.clip)? {
            Some(region) => Some(region),
            None => self.clip,
        };
        if let Some(region) = clip {
            builder = builder.clip(resolve_clip(region, scene)?);
        }

        Ok(builder.build()?)
    }
}

fn clip_from_args(args: &ClipArgs) -> Result<Option<PartialClipRegion>> {
    let argument = |e: parser::ParseError| CliError::Argument(e.to_string());

    if let Some(value) = &args.clip_sphere {
        let [x, y, z, radius] = parser::parse_floats::<4>(value).map_err(argument)?;
        return Ok(Some(PartialClipRegion::Sphere {
            center: [x, y, z],
            radius,
        }));
    }
    if let Some(value) = &args.clip_box {
        let [x1, y1, z1, x2, y2, z2] = parser::parse_floats::<6>(value).map_err(argument)?;
        return Ok(Some(PartialClipRegion::Box {
            min: [x1, y1, z1],
            max: [x2, y2, z2],
        }));
    }
    if let Some(value) = &args.clip_near {
        let (molecule, cutoff) = parser::parse_named_cutoff(value).map_err(argument)?;
        return Ok(Some(PartialClipRegion::NearMolecule { molecule, cutoff }));
    }
    Ok(None)
}

fn resolve_clip(region: PartialClipRegion, scene: &Scene) -> Result<ClipRegion> {
    Ok(match region {
        PartialClipRegion::Sphere { center, radius } => ClipRegion::Sphere {
            center: Point3::from(center),
            radius,
        },
        PartialClipRegion::Box { min, max } => ClipRegion::Box {
            min: Point3::from(min),
            max: Point3::from(max),
        },
        PartialClipRegion::NearMolecule { molecule, cutoff } => {
            let id = scene
                .find_molecule(&molecule)
                .ok_or_else(|| CliError::Scene(format!("no molecule named '{molecule}' to clip against")))?;
            let transform = scene.transform(id)?;
            let centres = scene
                .molecule(id)
                .map(|m| m.atoms().iter().map(|atom| transform * atom.position).collect())
                .unwrap_or_default();
            ClipRegion::NearAtoms {
                centres,
                cutoff: cutoff.unwrap_or(DEFAULT_PROXIMITY_CUTOFF),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use molsurf::core::models::atom::Atom;
    use molsurf::core::models::molecule::Molecule;
    use molsurf::engine::eligibility::MoleculeRole;
    use std::io::Write;

    fn surface_args(extra: &[&str]) -> SurfaceArgs {
        let mut argv = vec!["molsurf", "surface", "-s", "scene.toml", "-m", "ligand"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Surface(args) => args,
            _ => panic!("Expected 'surface' subcommand"),
        }
    }

    fn scene_with_probe() -> Scene {
        let mut scene = Scene::default();
        let mut probe = Molecule::new("pocket");
        probe.add_atom(Atom::new(6, Point3::new(1.0, 2.0, 3.0)));
        let root = scene.root();
        scene.add_molecule(probe, MoleculeRole::Macromolecule, root).unwrap();
        scene
    }

    fn write_toml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn cli_values_override_file_values() {
        let file = write_toml(
            r#"
            [surface]
            kind = "lee-richards"
            probe-radius = 1.0
            voxel-size = 0.3
            color = "element"
            "#,
        );
        let partial = PartialSurfaceConfig::from_file(file.path()).unwrap();
        let args = surface_args(&["--probe", "1.6", "--color", "polarity"]);
        let config = partial.merge_with_cli(&args, &Scene::default()).unwrap();

        assert_eq!(config.surface.kind, SurfaceKind::LeeRichards);
        assert_eq!(config.surface.probe_radius, 1.6);
        assert_eq!(config.surface.voxel_size, 0.3);
        assert_eq!(config.color_mode, Some(ColorMode::Polarity));
        assert!(config.clip.is_none());
    }

    #[test]
    fn file_clip_is_used_when_no_flag_given() {
        let file = write_toml(
            r#"
            [clip]
            type = "near-molecule"
            molecule = "pocket"
            "#,
        );
        let partial = PartialSurfaceConfig::from_file(file.path()).unwrap();
        let config = partial
            .merge_with_cli(&surface_args(&[]), &scene_with_probe())
            .unwrap();

        assert_eq!(
            config.clip,
            Some(ClipRegion::NearAtoms {
                centres: vec![Point3::new(1.0, 2.0, 3.0)],
                cutoff: DEFAULT_PROXIMITY_CUTOFF,
            })
        );
    }

    #[test]
    fn clip_flag_replaces_file_clip() {
        let file = write_toml(
            r#"
            [clip]
            type = "box"
            min = [0.0, 0.0, 0.0]
            max = [1.0, 1.0, 1.0]
            "#,
        );
        let partial = PartialSurfaceConfig::from_file(file.path()).unwrap();
        let config = partial
            .merge_with_cli(&surface_args(&["--clip-sphere", "1,1,1,4"]), &Scene::default())
            .unwrap();

        assert_eq!(
            config.clip,
            Some(ClipRegion::Sphere {
                center: Point3::new(1.0, 1.0, 1.0),
                radius: 4.0,
            })
        );
    }

    #[test]
    fn unknown_clip_molecule_is_a_scene_error() {
        let result = PartialSurfaceConfig::default()
            .merge_with_cli(&surface_args(&["--clip-near", "missing:3"]), &Scene::default());
        assert!(matches!(result, Err(CliError::Scene(_))));
    }

    #[test]
    fn malformed_flag_and_unknown_key_are_rejected() {
        let result = PartialSurfaceConfig::default()
            .merge_with_cli(&surface_args(&["--clip-sphere", "1,2,3"]), &Scene::default());
        assert!(matches!(result, Err(CliError::Argument(_))));

        let file = write_toml("[surface]\nprobe = 1.4\n");
        assert!(matches!(
            PartialSurfaceConfig::from_file(file.path()),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn invalid_probe_radius_surfaces_as_config_error() {
        let result = PartialSurfaceConfig::default()
            .merge_with_cli(&surface_args(&["--probe=-1"]), &Scene::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
