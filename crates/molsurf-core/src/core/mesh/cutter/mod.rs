//! Clipping of triangle meshes against a volume.
//!
//! A [`Cutter`] decides which mesh vertices lie inside its volume and where
//! the boundary sits along an edge from a kept vertex to a dropped one.
//! [`Cutter::cut`] then rewrites the mesh in place:
//!
//! 1. every vertex is classified (bulk pass, see [`Cutter::classify`]);
//! 2. a removed vertex that shares a triangle with a kept vertex is moved to
//!    the average of the boundary positions along all such edges;
//! 3. removed vertices without a kept neighbour are dropped together with
//!    every triangle that references them, and the buffers are compacted.
//!
//! The relocation is an approximation of the exact clip: it never creates
//! vertices, so mesh connectivity is preserved and no T-junctions appear.

mod boxed;
mod proximity;
mod sphere;

pub use boxed::BoxCutter;
pub use proximity::ProximityCutter;
pub use sphere::SphereCutter;

use super::Mesh;
use nalgebra::{Point3, Vector3};
use tracing::{debug, instrument};

/// Result of a clip operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutOutcome {
    /// Every vertex was inside the volume; the mesh was not touched.
    Unchanged = 0,
    /// Part of the mesh was removed or relocated.
    Partial = 1,
    /// Every vertex was outside the volume; the mesh is now empty.
    Removed = 2,
}

impl CutOutcome {
    /// Numeric result code (0 unchanged, 1 partial, 2 removed).
    pub fn code(self) -> u8 {
        self as u8
    }
}

pub trait Cutter: Send + Sync {
    /// Signed distance to the clip boundary; positive inside the retained volume.
    fn signed_distance(&self, point: &Point3<f32>) -> f32;

    fn retains(&self, point: &Point3<f32>) -> bool {
        self.signed_distance(point) >= 0.0
    }

    /// Classifies all points at once. Implementations with a spatial index
    /// override this to batch their queries.
    fn classify(&self, points: &[Point3<f32>]) -> Vec<bool> {
        points.iter().map(|p| self.retains(p)).collect()
    }

    /// Boundary position on the segment from a retained to a removed vertex.
    ///
    /// The default interpolates linearly in signed distance.
    fn interpolate(&self, retained: &Point3<f32>, removed: &Point3<f32>) -> Point3<f32> {
        let inside = self.signed_distance(retained);
        let outside = self.signed_distance(removed);
        let span = inside - outside;
        if span.abs() <= f32::EPSILON {
            return *retained;
        }
        let t = (inside / span).clamp(0.0, 1.0);
        retained + (removed - retained) * t
    }

    fn cut(&self, mesh: &mut Mesh) -> CutOutcome {
        clip_mesh(self, mesh)
    }
}

#[instrument(skip_all, name = "clip_mesh")]
pub fn clip_mesh<C: Cutter + ?Sized>(cutter: &C, mesh: &mut Mesh) -> CutOutcome {
    let keep = cutter.classify(&mesh.points);
    let retained = keep.iter().filter(|&&k| k).count();

    if retained == mesh.points.len() {
        return CutOutcome::Unchanged;
    }
    if retained == 0 {
        debug!(points = mesh.points.len(), "Clip removed the whole mesh");
        mesh.clear();
        return CutOutcome::Removed;
    }

    let relocated = relocate_boundary_vertices(cutter, mesh, &keep);

    let mut remap = vec![u32::MAX; mesh.points.len()];
    let mut next = 0u32;
    for (i, slot) in remap.iter_mut().enumerate() {
        if keep[i] || relocated[i].is_some() {
            *slot = next;
            next += 1;
        }
    }

    let before_triangles = mesh.triangles.len();
    mesh.triangles = mesh
        .triangles
        .iter()
        .filter_map(|tri| {
            let mapped = tri.map(|i| remap[i as usize]);
            mapped.iter().all(|&i| i != u32::MAX).then_some(mapped)
        })
        .collect();

    let points = std::mem::take(&mut mesh.points);
    mesh.points = points
        .into_iter()
        .enumerate()
        .filter(|(i, _)| remap[*i] != u32::MAX)
        .map(|(i, p)| relocated[i].unwrap_or(p))
        .collect();
    if let Some(colors) = mesh.colors.take() {
        mesh.colors = Some(compact(colors, &remap));
    }
    if let Some(normals) = mesh.normals.take() {
        mesh.normals = Some(compact(normals, &remap));
    }
    mesh.touch();

    debug!(
        kept = retained,
        relocated = relocated.iter().filter(|r| r.is_some()).count(),
        points = mesh.points.len(),
        triangles_dropped = before_triangles - mesh.triangles.len(),
        "Partial clip finished"
    );
    CutOutcome::Partial
}

/// Averaged boundary position for every removed vertex that shares a
/// triangle with a retained one. Each retained neighbour contributes once per
/// straddling triangle.
fn relocate_boundary_vertices<C: Cutter + ?Sized>(
    cutter: &C,
    mesh: &Mesh,
    keep: &[bool],
) -> Vec<Option<Point3<f32>>> {
    let mut sums = vec![(Vector3::<f32>::zeros(), 0u32); mesh.points.len()];
    for tri in &mesh.triangles {
        let kept = tri.iter().filter(|&&i| keep[i as usize]).count();
        if kept == 0 || kept == 3 {
            continue;
        }
        for &removed in tri.iter().filter(|&&i| !keep[i as usize]) {
            for &inside in tri.iter().filter(|&&i| keep[i as usize]) {
                let p = cutter.interpolate(&mesh.points[inside as usize], &mesh.points[removed as usize]);
                let entry = &mut sums[removed as usize];
                entry.0 += p.coords;
                entry.1 += 1;
            }
        }
    }
    sums.into_iter()
        .map(|(sum, n)| (n > 0).then(|| Point3::from(sum / n as f32)))
        .collect()
}

fn compact<T>(values: Vec<T>, remap: &[u32]) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter(|(i, _)| remap[*i] != u32::MAX)
        .map(|(_, v)| v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::tests::square;

    struct Everything(bool);

    impl Cutter for Everything {
        fn signed_distance(&self, _point: &Point3<f32>) -> f32 {
            if self.0 { 1.0 } else { -1.0 }
        }
    }

    /// Keeps the half-space `x <= plane`.
    struct HalfSpace {
        plane: f32,
    }

    impl Cutter for HalfSpace {
        fn signed_distance(&self, point: &Point3<f32>) -> f32 {
            self.plane - point.x
        }
    }

    fn assert_indices_valid(mesh: &Mesh) {
        for tri in mesh.triangles() {
            for &i in tri {
                assert!((i as usize) < mesh.point_count());
            }
        }
    }

    #[test]
    fn retaining_everything_leaves_mesh_untouched() {
        let mut mesh = square();
        mesh.compute_normals();
        let before = mesh.clone();
        let outcome = Everything(true).cut(&mut mesh);
        assert_eq!(outcome.code(), 0);
        assert_eq!(mesh, before);
    }

    #[test]
    fn rejecting_everything_empties_mesh() {
        let mut mesh = square();
        let outcome = Everything(false).cut(&mut mesh);
        assert_eq!(outcome, CutOutcome::Removed);
        assert_eq!(outcome.code(), 2);
        assert_eq!(mesh.point_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn single_triangle_with_one_outside_vertex_is_partially_clipped() {
        let mut mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let outcome = HalfSpace { plane: 1.0 }.cut(&mut mesh);

        assert_eq!(outcome.code(), 1);
        assert!(mesh.point_count() <= 3);
        assert_indices_valid(&mesh);
        assert_eq!(mesh.triangle_count(), 1);
        let moved = mesh.points()[1];
        assert!((moved.x - 1.0).abs() < 1e-6);
        assert!(mesh.points().iter().all(|p| p.x <= 1.0 + 1e-6));
    }

    #[test]
    fn relocation_averages_over_all_retained_neighbours() {
        // Vertex 1 is outside and shares triangles with both 0 and 2.
        let mut mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        HalfSpace { plane: 1.0 }.cut(&mut mesh);
        // Edge 0-1 crosses at (1, 0), edge 2-1 at (1, 1).
        let moved = mesh.points()[1];
        assert!((moved.x - 1.0).abs() < 1e-6);
        assert!((moved.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn isolated_outside_vertices_are_dropped_with_their_triangles() {
        // Strip of three squares along x; the last column is far outside.
        let points: Vec<Point3<f32>> = (0..4)
            .flat_map(|i| [Point3::new(i as f32, 0.0, 0.0), Point3::new(i as f32, 1.0, 0.0)])
            .collect();
        let mut triangles = Vec::new();
        for i in 0..3u32 {
            let (a, b, c, d) = (2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
        let mut mesh = Mesh::from_parts(points, triangles).unwrap();
        mesh.set_colors(vec![[0.5; 3]; 8]).unwrap();

        let outcome = HalfSpace { plane: 1.5 }.cut(&mut mesh);

        assert_eq!(outcome, CutOutcome::Partial);
        // Column x=3 has no retained neighbour and disappears.
        assert_eq!(mesh.point_count(), 6);
        assert_eq!(mesh.colors().unwrap().len(), 6);
        assert_eq!(mesh.triangle_count(), 4);
        assert_indices_valid(&mesh);
        assert!(mesh.points().iter().all(|p| p.x <= 1.5 + 1e-6));
    }

    #[test]
    fn partial_clip_bumps_generation() {
        let mut mesh = square();
        let before = mesh.generation();
        HalfSpace { plane: 0.5 }.cut(&mut mesh);
        assert!(mesh.generation() > before);
    }
}
