//! Indexed triangle meshes and the operations that act on them.
//!
//! A [`Mesh`] owns flat point and triangle buffers plus optional per-point
//! colour and normal arrays. Every mutation bumps [`Mesh::generation`] so
//! that renderers holding on to uploaded buffers can tell when to refresh.

pub mod cutter;
pub mod texture;

use crate::core::utils::geometry::face_normal;
use nalgebra::{Point3, Vector3};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("Triangle {triangle} references vertex {index}, but the mesh has only {count} points")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        count: usize,
    },
    #[error("Attribute '{attribute}' has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub(crate) points: Vec<Point3<f32>>,
    pub(crate) triangles: Vec<[u32; 3]>,
    pub(crate) colors: Option<Vec<[f32; 3]>>,
    pub(crate) normals: Option<Vec<Vector3<f32>>>,
    generation: u64,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from raw buffers, rejecting triangles that point past the
    /// end of `points`.
    pub fn from_parts(points: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        let mesh = Self {
            points,
            triangles,
            ..Self::default()
        };
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn points(&self) -> &[Point3<f32>] {
        &self.points
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn colors(&self) -> Option<&[[f32; 3]]> {
        self.colors.as_deref()
    }

    pub fn normals(&self) -> Option<&[Vector3<f32>]> {
        self.normals.as_deref()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Monotonic counter, bumped by every mutating operation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn set_colors(&mut self, colors: Vec<[f32; 3]>) -> Result<(), MeshError> {
        self.check_attribute("colors", colors.len())?;
        self.colors = Some(colors);
        self.touch();
        Ok(())
    }

    pub fn set_normals(&mut self, normals: Vec<Vector3<f32>>) -> Result<(), MeshError> {
        self.check_attribute("normals", normals.len())?;
        self.normals = Some(normals);
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.triangles.clear();
        self.colors = None;
        self.normals = None;
        self.touch();
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let count = self.points.len();
        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    count,
                });
            }
        }
        if let Some(colors) = &self.colors {
            self.check_attribute("colors", colors.len())?;
        }
        if let Some(normals) = &self.normals {
            self.check_attribute("normals", normals.len())?;
        }
        Ok(())
    }

    fn check_attribute(&self, attribute: &'static str, actual: usize) -> Result<(), MeshError> {
        let expected = self.points.len();
        if actual != expected {
            return Err(MeshError::AttributeLength {
                attribute,
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn positions_flat(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }

    pub fn indices_flat(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    pub fn colors_flat(&self) -> Option<Vec<f32>> {
        self.colors
            .as_ref()
            .map(|c| c.iter().flatten().copied().collect())
    }

    pub fn normals_flat(&self) -> Option<Vec<f32>> {
        self.normals
            .as_ref()
            .map(|n| n.iter().flat_map(|v| [v.x, v.y, v.z]).collect())
    }

    /// Recomputes area-weighted per-vertex normals.
    ///
    /// Degenerate faces contribute nothing; a vertex touched only by
    /// degenerate faces (or by none) receives the zero vector.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vector3::<f32>::zeros(); self.points.len()];
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| &self.points[i as usize]);
            if let Some(n) = face_normal(a, b, c) {
                for &i in tri {
                    accum[i as usize] += n;
                }
            }
        }
        for n in &mut accum {
            *n = n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
        }
        self.normals = Some(accum);
        self.touch();
    }

    pub fn statistics(&self) -> MeshStatistics {
        MeshStatistics::of(self)
    }
}

/// Triangle quality summary, used for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshStatistics {
    pub triangle_count: usize,
    pub degenerate_count: usize,
    pub min_angle_deg: f32,
    pub mean_angle_deg: f32,
    pub min_area: f32,
    pub mean_area: f32,
    pub total_area: f32,
}

impl MeshStatistics {
    fn of(mesh: &Mesh) -> Self {
        let mut stats = Self {
            triangle_count: mesh.triangles.len(),
            min_angle_deg: f32::INFINITY,
            min_area: f32::INFINITY,
            ..Self::default()
        };
        let mut angle_sum = 0.0;
        let mut measured = 0usize;

        for tri in &mesh.triangles {
            let [a, b, c] = tri.map(|i| mesh.points[i as usize]);
            let Some(n) = face_normal(&a, &b, &c) else {
                stats.degenerate_count += 1;
                continue;
            };
            let area = 0.5 * n.norm();
            stats.total_area += area;
            stats.min_area = stats.min_area.min(area);
            for (p, q, r) in [(a, b, c), (b, c, a), (c, a, b)] {
                let angle = (q - p).angle(&(r - p)).to_degrees();
                stats.min_angle_deg = stats.min_angle_deg.min(angle);
                angle_sum += angle;
            }
            measured += 1;
        }

        if measured == 0 {
            stats.min_angle_deg = 0.0;
            stats.min_area = 0.0;
        } else {
            stats.mean_angle_deg = angle_sum / (3 * measured) as f32;
            stats.mean_area = stats.total_area / measured as f32;
        }
        stats
    }

    pub fn log(&self, label: &str) {
        debug!(
            label,
            triangles = self.triangle_count,
            degenerate = self.degenerate_count,
            min_angle = self.min_angle_deg,
            mean_angle = self.mean_angle_deg,
            min_area = self.min_area,
            mean_area = self.mean_area,
            total_area = self.total_area,
            "Mesh statistics"
        );
    }
}
