use super::Cutter;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Keeps the part of a mesh within `cutoff` of any of a set of atom centres.
///
/// Used to crop a large surface down to the patch around a ligand or a
/// binding site.
pub struct ProximityCutter {
    tree: KdTree<f64, 3>,
    cutoff: f64,
    empty: bool,
}

impl std::fmt::Debug for ProximityCutter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityCutter")
            .field("cutoff", &self.cutoff)
            .field("centres", &self.tree.size())
            .finish()
    }
}

impl ProximityCutter {
    pub fn new(centres: &[Point3<f64>], cutoff: f64) -> Self {
        let coords: Vec<[f64; 3]> = centres.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree: KdTree<f64, 3> = (&coords).into();
        Self {
            tree,
            cutoff: cutoff.max(0.0),
            empty: centres.is_empty(),
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn nearest_distance(&self, point: &Point3<f32>) -> f64 {
        if self.empty {
            return f64::INFINITY;
        }
        let query = [point.x as f64, point.y as f64, point.z as f64];
        self.tree.nearest_one::<SquaredEuclidean>(&query).distance.sqrt()
    }
}

impl Cutter for ProximityCutter {
    fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        (self.cutoff - self.nearest_distance(point)) as f32
    }

    fn classify(&self, points: &[Point3<f32>]) -> Vec<bool> {
        #[cfg(feature = "parallel")]
        let iter = points.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = points.iter();

        iter.map(|p| self.nearest_distance(p) <= self.cutoff).collect()
    }
}
