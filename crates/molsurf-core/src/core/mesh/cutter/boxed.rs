use super::Cutter;
use nalgebra::Point3;

/// Keeps the part of a mesh inside an axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCutter {
    min: Point3<f32>,
    max: Point3<f32>,
}

impl BoxCutter {
    /// Corners may be given in any order.
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    pub fn from_center(center: Point3<f32>, half_extent: f32) -> Self {
        let h = nalgebra::Vector3::repeat(half_extent.abs());
        Self::new(center - h, center + h)
    }

    pub fn min(&self) -> Point3<f32> {
        self.min
    }

    pub fn max(&self) -> Point3<f32> {
        self.max
    }
}

impl Cutter for BoxCutter {
    /// Distance to the nearest face, negative outside. Outside the box this
    /// is the largest per-axis overshoot rather than the Euclidean distance.
    fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        (0..3)
            .map(|axis| (point[axis] - self.min[axis]).min(self.max[axis] - point[axis]))
            .fold(f32::INFINITY, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::tests::square;

    #[test]
    fn corners_are_normalised() {
        let cutter = BoxCutter::new(Point3::new(1.0, -1.0, 2.0), Point3::new(-1.0, 1.0, 0.0));
        assert_eq!(cutter.min(), Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(cutter.max(), Point3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn signed_distance_is_positive_inside_only() {
        let cutter = BoxCutter::from_center(Point3::origin(), 1.0);
        assert!((cutter.signed_distance(&Point3::origin()) - 1.0).abs() < 1e-6);
        assert!(cutter.signed_distance(&Point3::new(1.5, 0.0, 0.0)) < 0.0);
        assert!(cutter.retains(&Point3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn box_clip_moves_outside_corner_onto_face() {
        let mut mesh = square();
        let cutter = BoxCutter::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.75, 2.0, 0.5));
        assert_eq!(cutter.cut(&mut mesh).code(), 1);
        assert_eq!(mesh.point_count(), 4);
        for p in mesh.points() {
            assert!(p.x <= 0.75 + 1e-5);
        }
    }
}
