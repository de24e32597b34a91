use super::Cutter;
use nalgebra::Point3;

/// Keeps the part of a mesh inside a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCutter {
    center: Point3<f32>,
    radius: f32,
}

impl SphereCutter {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Cutter for SphereCutter {
    fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        self.radius - (point - self.center).norm()
    }

    /// Intersects the segment with the sphere instead of interpolating
    /// distances, which keeps boundary vertices on the sphere itself.
    fn interpolate(&self, retained: &Point3<f32>, removed: &Point3<f32>) -> Point3<f32> {
        let d = removed - retained;
        let f = retained - self.center;
        let a = d.norm_squared();
        if a <= f32::EPSILON {
            return *retained;
        }
        let b = 2.0 * f.dot(&d);
        let c = f.norm_squared() - self.radius * self.radius;
        let disc = (b * b - 4.0 * a * c).max(0.0);
        let t = ((-b + disc.sqrt()) / (2.0 * a)).clamp(0.0, 1.0);
        retained + d * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::cutter::CutOutcome;
    use crate::core::mesh::tests::square;

    #[test]
    fn large_sphere_keeps_everything() {
        let mut mesh = square();
        let outcome = SphereCutter::new(Point3::origin(), 10.0).cut(&mut mesh);
        assert_eq!(outcome, CutOutcome::Unchanged);
        assert_eq!(mesh.point_count(), 4);
    }

    #[test]
    fn distant_sphere_removes_everything() {
        let mut mesh = square();
        let outcome = SphereCutter::new(Point3::new(50.0, 0.0, 0.0), 1.0).cut(&mut mesh);
        assert_eq!(outcome, CutOutcome::Removed);
        assert!(mesh.is_empty());
    }

    #[test]
    fn interpolated_points_lie_on_sphere() {
        let cutter = SphereCutter::new(Point3::origin(), 2.0);
        let p = cutter.interpolate(&Point3::new(0.5, 0.0, 0.0), &Point3::new(3.0, 1.0, 0.0));
        assert!(((p - Point3::origin()).norm() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn clipped_square_stays_inside_sphere() {
        let mut mesh = square();
        let cutter = SphereCutter::new(Point3::origin(), 1.2);
        assert_eq!(cutter.cut(&mut mesh).code(), 1);
        for p in mesh.points() {
            assert!(p.coords.norm() <= 1.2 + 1e-5);
        }
    }
}
