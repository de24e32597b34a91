use crate::core::mesh::texture::ColorMode;
use crate::core::surface::{SurfaceKind, SurfaceParams};
use nalgebra::Point3;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.into(),
    }
}

/// Volume a finished surface is clipped against.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipRegion {
    Sphere { center: Point3<f64>, radius: f64 },
    Box { min: Point3<f64>, max: Point3<f64> },
    /// Keep the surface within `cutoff` of any of `centres`.
    NearAtoms { centres: Vec<Point3<f64>>, cutoff: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub surface: SurfaceParams,
    pub include_hydrogens: bool,
    pub color_mode: Option<ColorMode>,
    pub texture_cutoff: f64,
    pub clip: Option<ClipRegion>,
}

#[derive(Default)]
pub struct SurfaceConfigBuilder {
    kind: Option<SurfaceKind>,
    probe_radius: Option<f64>,
    voxel_size: Option<f64>,
    smoothing_iterations: Option<usize>,
    include_hydrogens: bool,
    color_mode: Option<ColorMode>,
    texture_cutoff: Option<f64>,
    clip: Option<ClipRegion>,
}

impl SurfaceConfigBuilder {
    pub const DEFAULT_TEXTURE_CUTOFF: f64 = 4.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: SurfaceKind) -> Self {
        self.kind = Some(kind);
        self
    }
    pub fn probe_radius(mut self, radius: f64) -> Self {
        self.probe_radius = Some(radius);
        self
    }
    pub fn voxel_size(mut self, size: f64) -> Self {
        self.voxel_size = Some(size);
        self
    }
    pub fn smoothing_iterations(mut self, iterations: usize) -> Self {
        self.smoothing_iterations = Some(iterations);
        self
    }
    pub fn include_hydrogens(mut self, include: bool) -> Self {
        self.include_hydrogens = include;
        self
    }
    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = Some(mode);
        self
    }
    pub fn texture_cutoff(mut self, cutoff: f64) -> Self {
        self.texture_cutoff = Some(cutoff);
        self
    }
    pub fn clip(mut self, region: ClipRegion) -> Self {
        self.clip = Some(region);
        self
    }

    pub fn build(self) -> Result<SurfaceConfig, ConfigError> {
        let defaults = SurfaceParams::default();
        let surface = SurfaceParams {
            kind: self.kind.ok_or(ConfigError::MissingParameter("kind"))?,
            probe_radius: self.probe_radius.unwrap_or(defaults.probe_radius),
            voxel_size: self.voxel_size.unwrap_or(defaults.voxel_size),
            smoothing_iterations: self
                .smoothing_iterations
                .unwrap_or(defaults.smoothing_iterations),
        };
        if !surface.probe_radius.is_finite() || surface.probe_radius < 0.0 {
            return Err(invalid("probe_radius", "must be a non-negative number"));
        }
        if !surface.voxel_size.is_finite() || surface.voxel_size <= 0.0 {
            return Err(invalid("voxel_size", "must be a positive number"));
        }

        let texture_cutoff = self.texture_cutoff.unwrap_or(Self::DEFAULT_TEXTURE_CUTOFF);
        if !texture_cutoff.is_finite() || texture_cutoff <= 0.0 {
            return Err(invalid("texture_cutoff", "must be a positive number"));
        }

        match &self.clip {
            Some(ClipRegion::Sphere { radius, .. }) if *radius <= 0.0 => {
                return Err(invalid("clip", "sphere radius must be positive"));
            }
            Some(ClipRegion::NearAtoms { cutoff, .. }) if *cutoff <= 0.0 => {
                return Err(invalid("clip", "proximity cutoff must be positive"));
            }
            _ => {}
        }

        Ok(SurfaceConfig {
            surface,
            include_hydrogens: self.include_hydrogens,
            color_mode: self.color_mode,
            texture_cutoff,
            clip: self.clip,
        })
    }
}

/// Which published interaction model supplies the default thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    /// Geometry rules of the Protein-Ligand Interaction Profiler.
    #[default]
    Plip,
    /// Coarser pharmacophore-feature model, distance-led.
    Pharmacophore,
}

impl CalculatorKind {
    pub fn criteria(self) -> InteractionCriteria {
        match self {
            Self::Plip => InteractionCriteria::plip(),
            Self::Pharmacophore => InteractionCriteria::pharmacophore(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown interaction model '{0}' (expected plip or pharmacophore)")]
pub struct ParseCalculatorKindError(String);

impl FromStr for CalculatorKind {
    type Err = ParseCalculatorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plip" => Ok(Self::Plip),
            "pharmacophore" => Ok(Self::Pharmacophore),
            _ => Err(ParseCalculatorKindError(s.to_string())),
        }
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plip => "plip",
            Self::Pharmacophore => "pharmacophore",
        })
    }
}

/// Distance (Angstrom) and angle (degree) thresholds of the pairwise classifier.
///
/// Deserialised from TOML with kebab-case keys; keys left out keep the PLIP
/// values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct InteractionCriteria {
    pub hydrophobic_max_distance: f64,

    pub hbond_max_distance: f64,
    /// Minimum donor-H...acceptor angle.
    pub hbond_min_angle: f64,

    pub halogen_enabled: bool,
    pub halogen_max_distance: f64,
    /// Ideal C-X...Y angle.
    pub halogen_donor_angle: f64,
    /// Ideal X...Y-Z angle.
    pub halogen_acceptor_angle: f64,
    pub halogen_angle_tolerance: f64,

    pub salt_bridge_max_distance: f64,

    pub pi_cation_max_distance: f64,
    /// Cutoff reduction at a 90 degree ring-normal angle.
    pub pi_cation_angle_penalty: f64,

    pub pi_stacking_max_distance: f64,
    pub pi_stacking_angle_tolerance: f64,
    pub pi_stacking_max_offset: f64,

    pub water_bridge_min_distance: f64,
    pub water_bridge_max_distance: f64,
    pub water_bridge_min_angle: f64,

    pub water_water_max_distance: f64,
}

impl Default for InteractionCriteria {
    fn default() -> Self {
        Self::plip()
    }
}

impl InteractionCriteria {
    pub fn plip() -> Self {
        Self {
            hydrophobic_max_distance: 4.0,
            hbond_max_distance: 4.1,
            hbond_min_angle: 100.0,
            halogen_enabled: true,
            halogen_max_distance: 4.0,
            halogen_donor_angle: 165.0,
            halogen_acceptor_angle: 120.0,
            halogen_angle_tolerance: 30.0,
            salt_bridge_max_distance: 5.5,
            pi_cation_max_distance: 6.5,
            pi_cation_angle_penalty: 1.5,
            pi_stacking_max_distance: 7.5,
            pi_stacking_angle_tolerance: 30.0,
            pi_stacking_max_offset: 2.0,
            water_bridge_min_distance: 2.5,
            water_bridge_max_distance: 4.0,
            water_bridge_min_angle: 100.0,
            water_water_max_distance: 3.5,
        }
    }

    pub fn pharmacophore() -> Self {
        Self {
            hydrophobic_max_distance: 4.5,
            hbond_max_distance: 3.5,
            hbond_min_angle: 90.0,
            halogen_enabled: false,
            salt_bridge_max_distance: 5.0,
            pi_cation_max_distance: 6.0,
            pi_cation_angle_penalty: 1.0,
            pi_stacking_max_distance: 5.5,
            ..Self::plip()
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let criteria: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        criteria.validate()?;
        Ok(criteria)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let distances = [
            ("hydrophobic-max-distance", self.hydrophobic_max_distance),
            ("hbond-max-distance", self.hbond_max_distance),
            ("halogen-max-distance", self.halogen_max_distance),
            ("salt-bridge-max-distance", self.salt_bridge_max_distance),
            ("pi-cation-max-distance", self.pi_cation_max_distance),
            ("pi-stacking-max-distance", self.pi_stacking_max_distance),
            ("pi-stacking-max-offset", self.pi_stacking_max_offset),
            ("water-bridge-min-distance", self.water_bridge_min_distance),
            ("water-bridge-max-distance", self.water_bridge_max_distance),
            ("water-water-max-distance", self.water_water_max_distance),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("{value} is not a non-negative distance")));
            }
        }

        let angles = [
            ("hbond-min-angle", self.hbond_min_angle),
            ("halogen-donor-angle", self.halogen_donor_angle),
            ("halogen-acceptor-angle", self.halogen_acceptor_angle),
            ("halogen-angle-tolerance", self.halogen_angle_tolerance),
            ("pi-stacking-angle-tolerance", self.pi_stacking_angle_tolerance),
            ("water-bridge-min-angle", self.water_bridge_min_angle),
        ];
        for (name, value) in angles {
            if !(0.0..=180.0).contains(&value) {
                return Err(invalid(name, format!("{value} is outside [0, 180] degrees")));
            }
        }

        if self.water_bridge_min_distance > self.water_bridge_max_distance {
            return Err(invalid(
                "water-bridge-min-distance",
                "must not exceed water-bridge-max-distance",
            ));
        }
        if !self.pi_cation_angle_penalty.is_finite()
            || self.pi_cation_angle_penalty < 0.0
            || self.pi_cation_angle_penalty > self.pi_cation_max_distance
        {
            return Err(invalid(
                "pi-cation-angle-penalty",
                "must lie between 0 and pi-cation-max-distance",
            ));
        }
        Ok(())
    }

    /// Largest distance any enabled predicate accepts; used as a prefilter.
    pub fn max_cutoff(&self) -> f64 {
        let mut cutoffs = vec![
            self.hydrophobic_max_distance,
            self.hbond_max_distance,
            self.salt_bridge_max_distance,
            self.pi_cation_max_distance,
            self.pi_stacking_max_distance,
            self.water_bridge_max_distance,
            self.water_water_max_distance,
        ];
        if self.halogen_enabled {
            cutoffs.push(self.halogen_max_distance);
        }
        cutoffs.into_iter().fold(0.0, f64::max)
    }
}
