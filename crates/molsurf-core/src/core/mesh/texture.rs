use super::Mesh;
use crate::core::elements;
use crate::core::models::atom::Atom;
use nalgebra::Point3;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Colour returned for points with no atom inside the cutoff.
pub const NEUTRAL_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

const POSITIVE_COLOR: [f32; 3] = [0.2, 0.3, 1.0];
const NEGATIVE_COLOR: [f32; 3] = [1.0, 0.2, 0.2];
const UNCHARGED_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const POLAR_COLOR: [f32; 3] = [0.25, 0.55, 0.95];
const APOLAR_COLOR: [f32; 3] = [0.95, 0.85, 0.55];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    Element,
    Charge,
    Polarity,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown color mode '{0}' (expected element, charge or polarity)")]
pub struct ParseColorModeError(String);

impl FromStr for ColorMode {
    type Err = ParseColorModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "element" | "cpk" => Ok(Self::Element),
            "charge" => Ok(Self::Charge),
            "polarity" => Ok(Self::Polarity),
            _ => Err(ParseColorModeError(s.to_string())),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Element => "element",
            Self::Charge => "charge",
            Self::Polarity => "polarity",
        };
        f.write_str(name)
    }
}

impl ColorMode {
    fn atom_color(self, atom: &Atom) -> [f32; 3] {
        match self {
            Self::Element => elements::color(atom.atomic_number),
            Self::Charge => match atom.formal_charge {
                q if q > 0 => POSITIVE_COLOR,
                q if q < 0 => NEGATIVE_COLOR,
                _ => UNCHARGED_COLOR,
            },
            Self::Polarity => {
                if atom.formal_charge != 0 || elements::is_polar_heteroatom(atom.atomic_number) {
                    POLAR_COLOR
                } else {
                    APOLAR_COLOR
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct TexelSource {
    position: Point3<f64>,
    color: [f32; 3],
}

/// Colours surface points from the atoms underneath them.
///
/// Atoms are kept sorted by x so a query only scans the slab
/// `[x - cutoff, x + cutoff]`. Within the cutoff each atom contributes with
/// weight `(1 - d / cutoff)^2`.
#[derive(Debug, Clone)]
pub struct SurfaceTexture {
    sources: Vec<TexelSource>,
    cutoff: f64,
    mode: ColorMode,
}

impl SurfaceTexture {
    pub fn new<'a>(atoms: impl IntoIterator<Item = &'a Atom>, mode: ColorMode, cutoff: f64) -> Self {
        let mut sources: Vec<TexelSource> = atoms
            .into_iter()
            .map(|atom| TexelSource {
                position: atom.position,
                color: mode.atom_color(atom),
            })
            .collect();
        sources.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));
        Self {
            sources,
            cutoff: cutoff.max(f64::EPSILON),
            mode,
        }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn color_at(&self, point: &Point3<f64>) -> [f32; 3] {
        let start = self
            .sources
            .partition_point(|s| s.position.x < point.x - self.cutoff);
        let mut blend = [0.0f64; 3];
        let mut total = 0.0;
        for source in self.sources[start..]
            .iter()
            .take_while(|s| s.position.x <= point.x + self.cutoff)
        {
            let d = (source.position - point).norm();
            if d >= self.cutoff {
                continue;
            }
            let w = (1.0 - d / self.cutoff).powi(2);
            for (acc, c) in blend.iter_mut().zip(source.color) {
                *acc += w * c as f64;
            }
            total += w;
        }
        if total <= 0.0 {
            return NEUTRAL_COLOR;
        }
        blend.map(|c| (c / total) as f32)
    }

    /// Fills the colour array of `mesh`, one entry per point.
    #[instrument(skip_all, name = "surface_texture")]
    pub fn apply(&self, mesh: &mut Mesh) {
        #[cfg(feature = "parallel")]
        let iter = mesh.points.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = mesh.points.iter();

        let colors: Vec<[f32; 3]> = iter.map(|p| self.color_at(&p.cast::<f64>())).collect();
        mesh.colors = Some(colors);
        mesh.touch();
    }
}
