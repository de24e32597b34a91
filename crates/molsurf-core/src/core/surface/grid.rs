use super::SurfaceError;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Upper bound on grid samples; about 400 MB of `f32`.
pub const MAX_GRID_POINTS: usize = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

/// Regular grid of signed distances, negative inside.
///
/// Values are clamped to `[-limit, limit]`; samples further than `limit`
/// from every sphere surface keep the initial `+limit`.
#[derive(Debug, Clone)]
pub(crate) struct DistanceGrid {
    origin: Point3<f32>,
    spacing: f32,
    dims: [usize; 3],
    limit: f32,
    values: Vec<f32>,
}

impl DistanceGrid {
    /// Grid covering the bounding box of `spheres` grown by `padding` on every side.
    pub fn enclosing(spheres: &[Sphere], spacing: f32, padding: f32, limit: f32) -> Result<Self, SurfaceError> {
        let first = spheres.first().ok_or(SurfaceError::EmptyInput)?;
        let (lo, hi) = spheres.iter().fold((first.center, first.center), |(lo, hi), s| {
            (lo.inf(&s.center), hi.sup(&s.center))
        });
        let pad = Vector3::repeat(padding);
        let origin = lo - pad;
        let extent = (hi + pad) - origin;

        let dims = [0, 1, 2].map(|axis| (extent[axis] / spacing).ceil() as usize + 1);
        let points = dims
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&n| n <= MAX_GRID_POINTS)
            .ok_or(SurfaceError::GridTooLarge {
                dims,
                limit: MAX_GRID_POINTS,
            })?;

        Ok(Self {
            origin,
            spacing,
            dims,
            limit,
            values: vec![limit; points],
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    #[inline]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + self.dims[0] * (iy + self.dims[1] * iz)
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> f32 {
        self.values[index]
    }

    #[inline]
    pub fn point(&self, ix: usize, iy: usize, iz: usize) -> Point3<f32> {
        self.origin + Vector3::new(ix as f32, iy as f32, iz as f32) * self.spacing
    }

    pub fn point_at(&self, index: usize) -> Point3<f32> {
        let ix = index % self.dims[0];
        let iy = (index / self.dims[0]) % self.dims[1];
        let iz = index / (self.dims[0] * self.dims[1]);
        self.point(ix, iy, iz)
    }

    /// Lowers every sample to `|p - c| - r` of the closest sphere.
    ///
    /// Work is split by z-slice; each slice only visits spheres whose
    /// influence band reaches it.
    pub fn stamp(&mut self, spheres: &[Sphere]) {
        let [nx, ny, _] = self.dims;
        let (origin, spacing, limit) = (self.origin, self.spacing, self.limit);

        let fill_slice = |iz: usize, slice: &mut [f32]| {
            let wz = origin.z + iz as f32 * spacing;
            for sphere in spheres {
                let reach = sphere.radius + limit;
                let dz = wz - sphere.center.z;
                if dz.abs() > reach {
                    continue;
                }
                let reach_sq = reach * reach;
                let lo_x = (((sphere.center.x - reach - origin.x) / spacing).floor().max(0.0)) as usize;
                let hi_x = (((sphere.center.x + reach - origin.x) / spacing).ceil() as usize).min(nx - 1);
                let lo_y = (((sphere.center.y - reach - origin.y) / spacing).floor().max(0.0)) as usize;
                let hi_y = (((sphere.center.y + reach - origin.y) / spacing).ceil() as usize).min(ny - 1);

                for iy in lo_y..=hi_y {
                    let dy = origin.y + iy as f32 * spacing - sphere.center.y;
                    let dyz_sq = dy * dy + dz * dz;
                    if dyz_sq > reach_sq {
                        continue;
                    }
                    let row = iy * nx;
                    for ix in lo_x..=hi_x {
                        let dx = origin.x + ix as f32 * spacing - sphere.center.x;
                        let dist_sq = dx * dx + dyz_sq;
                        if dist_sq > reach_sq {
                            continue;
                        }
                        let d = (dist_sq.sqrt() - sphere.radius).clamp(-limit, limit);
                        let slot = &mut slice[row + ix];
                        if d < *slot {
                            *slot = d;
                        }
                    }
                }
            }
        };

        #[cfg(feature = "parallel")]
        self.values
            .par_chunks_mut(nx * ny)
            .enumerate()
            .for_each(|(iz, slice)| fill_slice(iz, slice));

        #[cfg(not(feature = "parallel"))]
        self.values
            .chunks_mut(nx * ny)
            .enumerate()
            .for_each(|(iz, slice)| fill_slice(iz, slice));
    }

    /// Replaces every sample by `f(position, current_value)`.
    pub fn remap<F>(&mut self, f: F)
    where
        F: Fn(Point3<f32>, f32) -> f32 + Sync,
    {
        let [nx, ny, _] = self.dims;
        let (origin, spacing) = (self.origin, self.spacing);
        let map_slice = |iz: usize, slice: &mut [f32]| {
            for (i, value) in slice.iter_mut().enumerate() {
                let p = origin + Vector3::new((i % nx) as f32, (i / nx) as f32, iz as f32) * spacing;
                *value = f(p, *value);
            }
        };

        #[cfg(feature = "parallel")]
        self.values
            .par_chunks_mut(nx * ny)
            .enumerate()
            .for_each(|(iz, slice)| map_slice(iz, slice));

        #[cfg(not(feature = "parallel"))]
        self.values
            .chunks_mut(nx * ny)
            .enumerate()
            .for_each(|(iz, slice)| map_slice(iz, slice));
    }
}
