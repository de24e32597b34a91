use super::tetra::RawMesh;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use tracing::trace;

const TAUBIN_LAMBDA: f32 = 0.5;
const TAUBIN_MU: f32 = -0.53;

/// Merges the endpoints of edges shorter than `min_edge`, shortest first.
///
/// Marching tetrahedra emit slivers wherever the surface passes close to a
/// grid point; welding removes them before smoothing and normal estimation.
/// An edge is only collapsed when the result stays a closed 2-manifold: the
/// edge borders exactly two triangles, its endpoints share exactly the two
/// opposite vertices as neighbours (the link condition), and neither opposite
/// vertex drops below three neighbours. Edges failing the test are kept.
pub(crate) fn weld(mesh: RawMesh, min_edge: f32) -> RawMesh {
    let RawMesh { mut points, triangles } = mesh;
    let mut triangles = distinct_triangles(triangles);
    let mut alive = vec![true; triangles.len()];
    let mut weight = vec![1.0f32; points.len()];
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); points.len()];
    for (t, tri) in triangles.iter().enumerate() {
        for &v in tri {
            incident[v as usize].push(t);
        }
    }

    let min_sq = min_edge * min_edge;
    let candidates: Vec<(u32, u32)> = triangles
        .iter()
        .flat_map(|tri| [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])])
        .map(|(a, b)| (a.min(b), a.max(b)))
        .filter(|&(a, b)| (points[a as usize] - points[b as usize]).norm_squared() < min_sq)
        .unique()
        .sorted_by(|x, y| {
            let length = |&(a, b): &(u32, u32)| (points[a as usize] - points[b as usize]).norm_squared();
            length(x).total_cmp(&length(y))
        })
        .collect();

    let mut collapsed = 0usize;
    for (a, b) in candidates {
        let (a, b) = (a as usize, b as usize);
        if incident[a].is_empty() || incident[b].is_empty() {
            continue;
        }
        if (points[a] - points[b]).norm_squared() >= min_sq {
            continue;
        }
        let Some(shared) = collapsible(a, b, &triangles, &alive, &incident) else {
            continue;
        };

        let touched: Vec<usize> = shared
            .iter()
            .flat_map(|&t| triangles[t])
            .map(|v| v as usize)
            .filter(|&v| v != b)
            .unique()
            .collect();
        for t in shared {
            alive[t] = false;
        }
        let moved = std::mem::take(&mut incident[b]);
        for t in moved {
            if !alive[t] {
                continue;
            }
            for v in triangles[t].iter_mut() {
                if *v as usize == b {
                    *v = a as u32;
                }
            }
            incident[a].push(t);
        }
        for v in touched {
            incident[v].retain(|&t| alive[t]);
        }

        let total = weight[a] + weight[b];
        points[a] = Point3::from((points[a].coords * weight[a] + points[b].coords * weight[b]) / total);
        weight[a] = total;
        collapsed += 1;
    }
    trace!(collapsed, "Welded short edges");

    let mut remap = vec![u32::MAX; points.len()];
    let mut out = RawMesh::default();
    for (tri, _) in triangles.iter().zip(&alive).filter(|(_, keep)| **keep) {
        let mapped = tri.map(|v| {
            let v = v as usize;
            if remap[v] == u32::MAX {
                remap[v] = out.points.len() as u32;
                out.points.push(points[v]);
            }
            remap[v]
        });
        out.triangles.push(mapped);
    }
    out
}

/// Drops triangles with a repeated corner and repeats of the same corner set.
fn distinct_triangles(triangles: Vec<[u32; 3]>) -> Vec<[u32; 3]> {
    let mut seen = HashSet::new();
    triangles
        .into_iter()
        .filter(|tri| tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2])
        .filter(|tri| seen.insert(tri.iter().copied().sorted().collect_vec()))
        .collect()
}

fn neighbours(v: usize, triangles: &[[u32; 3]], alive: &[bool], incident: &[Vec<usize>]) -> HashSet<usize> {
    incident[v]
        .iter()
        .filter(|&&t| alive[t])
        .flat_map(|&t| triangles[t])
        .map(|u| u as usize)
        .filter(|&u| u != v)
        .collect()
}

/// The two triangles bordering edge `a`-`b` when collapsing it keeps the
/// mesh manifold, `None` otherwise.
fn collapsible(
    a: usize,
    b: usize,
    triangles: &[[u32; 3]],
    alive: &[bool],
    incident: &[Vec<usize>],
) -> Option<[usize; 2]> {
    let shared: Vec<usize> = incident[a]
        .iter()
        .copied()
        .filter(|&t| alive[t] && triangles[t].contains(&(b as u32)))
        .collect();
    let &[first, second] = shared.as_slice() else {
        return None;
    };

    let opposite = |t: usize| {
        triangles[t]
            .iter()
            .map(|&v| v as usize)
            .find(|&v| v != a && v != b)
    };
    let (x, y) = (opposite(first)?, opposite(second)?);
    if x == y {
        return None;
    }

    let around_a = neighbours(a, triangles, alive, incident);
    let around_b = neighbours(b, triangles, alive, incident);
    let common: HashSet<usize> = around_a.intersection(&around_b).copied().collect();
    if common.len() != 2 || !common.contains(&x) || !common.contains(&y) {
        return None;
    }
    if neighbours(x, triangles, alive, incident).len() <= 3 || neighbours(y, triangles, alive, incident).len() <= 3 {
        return None;
    }
    Some([first, second])
}

/// Taubin smoothing: alternating shrink (`lambda`) and inflate (`mu`)
/// Laplacian steps, which smooths without the volume loss of plain Laplacian.
pub(crate) fn smooth(mesh: &mut RawMesh, iterations: usize) {
    if iterations == 0 || mesh.points.is_empty() {
        return;
    }
    let mut neighbours: Vec<Vec<u32>> = vec![Vec::new(); mesh.points.len()];
    for tri in &mesh.triangles {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            neighbours[a as usize].push(b);
            neighbours[b as usize].push(a);
        }
    }
    for list in &mut neighbours {
        list.sort_unstable();
        list.dedup();
    }

    for _ in 0..iterations {
        for factor in [TAUBIN_LAMBDA, TAUBIN_MU] {
            let next: Vec<Point3<f32>> = mesh
                .points
                .iter()
                .zip(&neighbours)
                .map(|(p, ring)| {
                    if ring.is_empty() {
                        return *p;
                    }
                    let mean = ring
                        .iter()
                        .map(|&n| mesh.points[n as usize].coords)
                        .sum::<Vector3<f32>>()
                        / ring.len() as f32;
                    p + (mean - p.coords) * factor
                })
                .collect();
            mesh.points = next;
        }
    }
}
