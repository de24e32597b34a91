//! Zero-isosurface extraction by marching tetrahedra.
//!
//! Every voxel is split into six tetrahedra sharing the main diagonal from
//! corner 0 to corner 7, so neighbouring voxels triangulate their common
//! faces identically and the resulting mesh is closed. Vertices are keyed by
//! the grid edge they sit on, which keeps the output indexed.

use super::grid::DistanceGrid;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// Corner `c` of a voxel sits at offset `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

#[derive(Debug, Default)]
pub(crate) struct RawMesh {
    pub points: Vec<Point3<f32>>,
    pub triangles: Vec<[u32; 3]>,
}

struct Extractor<'a> {
    grid: &'a DistanceGrid,
    edge_vertices: HashMap<(usize, usize), u32>,
    mesh: RawMesh,
}

impl Extractor<'_> {
    fn vertex_on_edge(&mut self, a: usize, b: usize) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&v) = self.edge_vertices.get(&key) {
            return v;
        }
        let (va, vb) = (self.grid.value_at(key.0), self.grid.value_at(key.1));
        let (pa, pb) = (self.grid.point_at(key.0), self.grid.point_at(key.1));
        let span = va - vb;
        let t = if span.abs() <= f32::EPSILON {
            0.5
        } else {
            (va / span).clamp(0.0, 1.0)
        };
        let index = self.mesh.points.len() as u32;
        self.mesh.points.push(pa + (pb - pa) * t);
        self.edge_vertices.insert(key, index);
        index
    }

    /// Appends a triangle, flipped if needed so its normal points along `outward`.
    fn push_oriented(&mut self, mut tri: [u32; 3], outward: &Vector3<f32>) {
        let [a, b, c] = tri.map(|i| self.mesh.points[i as usize]);
        if (b - a).cross(&(c - a)).dot(outward) < 0.0 {
            tri.swap(1, 2);
        }
        self.mesh.triangles.push(tri);
    }

    fn polygonise(&mut self, corners: [usize; 4]) {
        let inside: Vec<usize> = corners
            .iter()
            .copied()
            .filter(|&c| self.grid.value_at(c) < 0.0)
            .collect();
        let outside: Vec<usize> = corners
            .iter()
            .copied()
            .filter(|&c| self.grid.value_at(c) >= 0.0)
            .collect();
        if inside.is_empty() || outside.is_empty() {
            return;
        }

        let centroid = |ids: &[usize]| -> Vector3<f32> {
            ids.iter()
                .map(|&i| self.grid.point_at(i).coords)
                .sum::<Vector3<f32>>()
                / ids.len() as f32
        };
        let outward = centroid(&outside) - centroid(&inside);

        match (inside.as_slice(), outside.as_slice()) {
            (&[lone], others) | (others, &[lone]) if others.len() == 3 => {
                let tri = [
                    self.vertex_on_edge(lone, others[0]),
                    self.vertex_on_edge(lone, others[1]),
                    self.vertex_on_edge(lone, others[2]),
                ];
                self.push_oriented(tri, &outward);
            }
            (&[i1, i2], &[o1, o2]) => {
                let quad = [
                    self.vertex_on_edge(i1, o1),
                    self.vertex_on_edge(i1, o2),
                    self.vertex_on_edge(i2, o2),
                    self.vertex_on_edge(i2, o1),
                ];
                self.push_oriented([quad[0], quad[1], quad[2]], &outward);
                self.push_oriented([quad[0], quad[2], quad[3]], &outward);
            }
            _ => {}
        }
    }
}

/// Triangulates the surface where the grid changes sign.
pub(crate) fn extract(grid: &DistanceGrid) -> RawMesh {
    let [nx, ny, nz] = grid.dims();
    let mut extractor = Extractor {
        grid,
        edge_vertices: HashMap::new(),
        mesh: RawMesh::default(),
    };
    if nx < 2 || ny < 2 || nz < 2 {
        return extractor.mesh;
    }

    for iz in 0..nz - 1 {
        for iy in 0..ny - 1 {
            for ix in 0..nx - 1 {
                let corners: [usize; 8] = std::array::from_fn(|c| {
                    grid.index(ix + (c & 1), iy + ((c >> 1) & 1), iz + ((c >> 2) & 1))
                });
                let first = grid.value_at(corners[0]) < 0.0;
                if corners.iter().all(|&c| (grid.value_at(c) < 0.0) == first) {
                    continue;
                }
                for tet in TETRAHEDRA {
                    extractor.polygonise(tet.map(|c| corners[c]));
                }
            }
        }
    }
    extractor.mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::grid::Sphere;

    fn sphere_mesh(radius: f32, spacing: f32) -> RawMesh {
        let spheres = [Sphere {
            center: Point3::new(0.3, -0.2, 0.1),
            radius,
        }];
        let mut grid = DistanceGrid::enclosing(&spheres, spacing, radius + 2.0 * spacing, radius).unwrap();
        grid.stamp(&spheres);
        extract(&grid)
    }

    #[test]
    fn sphere_vertices_lie_on_the_sphere() {
        let mesh = sphere_mesh(2.0, 0.4);
        assert!(!mesh.triangles.is_empty());
        let center = Point3::new(0.3, -0.2, 0.1);
        for p in &mesh.points {
            assert!(((p - center).norm() - 2.0).abs() < 0.08);
        }
    }

    #[test]
    fn sphere_mesh_is_closed() {
        let mesh = sphere_mesh(1.5, 0.5);
        let mut edges: HashMap<(u32, u32), usize> = HashMap::new();
        for tri in &mesh.triangles {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        assert!(edges.values().all(|&n| n == 2));
    }

    #[test]
    fn triangles_face_away_from_the_centre() {
        let mesh = sphere_mesh(2.0, 0.5);
        let center = Point3::new(0.3, -0.2, 0.1);
        let mut outward = 0usize;
        let mut measured = 0usize;
        for tri in &mesh.triangles {
            let [a, b, c] = tri.map(|i| mesh.points[i as usize]);
            let n = (b - a).cross(&(c - a));
            if n.norm() < 1e-3 {
                continue;
            }
            measured += 1;
            let mid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            if n.dot(&(mid - center)) > 0.0 {
                outward += 1;
            }
        }
        assert_eq!(outward, measured);
    }
}
