use nalgebra::Point3;
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

/// Uniform spatial hash over probe centres.
///
/// Queries search the 27 cells around the query point, so they are exact for
/// any radius up to the cell size.
#[derive(Debug, Clone)]
pub(crate) struct ProbeIndex {
    cell: f32,
    cells: HashMap<CellKey, Vec<Point3<f32>>>,
}

impl ProbeIndex {
    pub fn new(centres: &[Point3<f32>], cell: f32) -> Self {
        let mut cells: HashMap<CellKey, Vec<Point3<f32>>> = HashMap::new();
        for &c in centres {
            cells.entry(key(&c, cell)).or_default().push(c);
        }
        Self { cell, cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Distance to the closest centre, if one lies within `max_distance`
    /// (which must not exceed the cell size).
    pub fn nearest_within(&self, point: &Point3<f32>, max_distance: f32) -> Option<f32> {
        let (cx, cy, cz) = key(point, self.cell);
        let mut best_sq = max_distance * max_distance;
        let mut found = false;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for c in bucket {
                        let d_sq = (c - point).norm_squared();
                        if d_sq <= best_sq {
                            best_sq = d_sq;
                            found = true;
                        }
                    }
                }
            }
        }
        found.then(|| best_sq.sqrt())
    }
}

fn key(p: &Point3<f32>, cell: f32) -> CellKey {
    (
        (p.x / cell).floor() as i64,
        (p.y / cell).floor() as i64,
        (p.z / cell).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nearest_across_cell_borders() {
        let index = ProbeIndex::new(
            &[Point3::new(0.95, 0.0, 0.0), Point3::new(-0.5, 0.0, 0.0)],
            1.0,
        );
        let d = index.nearest_within(&Point3::new(1.05, 0.0, 0.0), 1.0).unwrap();
        assert!((d - 0.1).abs() < 1e-5);
    }

    #[test]
    fn ignores_centres_beyond_the_radius() {
        let index = ProbeIndex::new(&[Point3::new(0.9, 0.9, 0.0)], 1.0);
        assert!(index.nearest_within(&Point3::origin(), 1.0).is_none());
        assert!(!index.is_empty());
        assert!(ProbeIndex::new(&[], 1.0).is_empty());
    }
}
