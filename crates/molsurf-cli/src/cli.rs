use clap::{Args, Parser, Subcommand};
use molsurf::core::mesh::texture::ColorMode;
use molsurf::core::surface::SurfaceKind;
use molsurf::engine::config::CalculatorKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "molsurf CLI - molecular surface meshes and non-covalent interaction detection for molecular scenes.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the molecular surface of one molecule of a scene.
    Surface(SurfaceArgs),
    /// Detect non-covalent interactions between the molecules of a scene.
    Interactions(InteractionsArgs),
}

/// Arguments for the `surface` subcommand.
#[derive(Args, Debug)]
pub struct SurfaceArgs {
    // --- Core Arguments ---
    /// Path to the scene description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    /// Name of the molecule whose surface is built.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub molecule: String,

    /// Optional surface settings file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path for the mesh in JSON format. Only statistics are printed when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Surface Overrides ---
    /// Surface definition (connolly or lee-richards).
    #[arg(short, long, value_name = "KIND")]
    pub kind: Option<SurfaceKind>,

    /// Probe radius in Angstrom.
    #[arg(short, long = "probe", value_name = "FLOAT")]
    pub probe_radius: Option<f64>,

    /// Edge length of the sampling grid in Angstrom.
    #[arg(long = "voxel", value_name = "FLOAT")]
    pub voxel_size: Option<f64>,

    /// Number of smoothing passes applied to the mesh.
    #[arg(long, value_name = "INT")]
    pub smoothing: Option<usize>,

    /// Include hydrogen atoms in the surface.
    #[arg(long)]
    pub hydrogens: bool,

    /// Colour vertices by element, charge or polarity.
    #[arg(long = "color", value_name = "MODE")]
    pub color_mode: Option<ColorMode>,

    #[command(flatten)]
    pub clip: ClipArgs,
}

/// Mutually exclusive clip regions.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct ClipArgs {
    /// Keep the part of the surface inside the sphere "x,y,z,r".
    #[arg(long, value_name = "X,Y,Z,R")]
    pub clip_sphere: Option<String>,

    /// Keep the part of the surface inside the box "x1,y1,z1,x2,y2,z2".
    #[arg(long, value_name = "X1,Y1,Z1,X2,Y2,Z2")]
    pub clip_box: Option<String>,

    /// Keep the part of the surface near the atoms of another molecule, "NAME" or "NAME:CUTOFF".
    #[arg(long, value_name = "NAME[:CUTOFF]")]
    pub clip_near: Option<String>,
}

/// Arguments for the `interactions` subcommand.
#[derive(Args, Debug)]
pub struct InteractionsArgs {
    /// Path to the scene description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    /// Threshold preset used to classify contacts.
    #[arg(short, long, value_name = "MODEL", default_value_t = CalculatorKind::Plip)]
    pub model: CalculatorKind,

    /// Custom thresholds in TOML format; replaces the preset.
    #[arg(long, value_name = "PATH")]
    pub criteria: Option<PathBuf>,

    /// Write one row per interaction to this CSV file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Only report pairs whose molecules are both visible.
    #[arg(long)]
    pub visible_only: bool,
}
