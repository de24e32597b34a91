use nalgebra::{Matrix3, Point3, Unit, Vector3};

/// Below this squared cross-product length a triangle is treated as degenerate.
pub const DEGENERATE_AREA_EPSILON: f32 = 1e-12;

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Best-fit plane normal of a point set.
///
/// The normal is the left singular vector belonging to the smallest singular
/// value of the covariance of the centred coordinates. Returns `None` for
/// fewer than three points or a numerically degenerate set.
pub fn plane_normal(points: &[Point3<f64>]) -> Option<Unit<Vector3<f64>>> {
    if points.len() < 3 {
        return None;
    }
    let center = centroid(points)?;
    let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p - center;
        acc + d * d.transpose()
    });

    let svd = covariance.svd(true, false);
    let u = svd.u?;
    let (smallest, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))?;
    let normal: Vector3<f64> = u.column(smallest).into_owned();
    Unit::try_new(normal, 1e-12)
}

/// Angle in degrees between two vectors, `None` if either has zero length.
pub fn angle_between_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let denom = a.norm() * b.norm();
    if denom < 1e-12 {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Angle `a-vertex-b` in degrees.
pub fn angle_at_deg(a: &Point3<f64>, vertex: &Point3<f64>, b: &Point3<f64>) -> Option<f64> {
    angle_between_deg(&(a - vertex), &(b - vertex))
}

/// Folds an angle in `[0, 180]` onto `[0, 90]`; used for undirected axes such as ring normals.
pub fn fold_to_acute(angle_deg: f64) -> f64 {
    if angle_deg > 90.0 {
        180.0 - angle_deg
    } else {
        angle_deg
    }
}

/// Distance between the projection of `point` onto the plane through
/// `plane_point` with unit `normal`, and `plane_point` itself.
pub fn in_plane_offset(point: &Point3<f64>, plane_point: &Point3<f64>, normal: &Unit<Vector3<f64>>) -> f64 {
    let d = point - plane_point;
    let along = normal.dot(&d);
    (d - normal.into_inner() * along).norm()
}

/// Unnormalised face normal (twice the area vector), `None` when the triangle
/// is degenerate (collinear or coincident corners).
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Option<Vector3<f32>> {
    let n = (b - a).cross(&(c - a));
    if n.norm_squared() <= DEGENERATE_AREA_EPSILON {
        None
    } else {
        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "expected {b}, got {a}");
    }

    #[test]
    fn centroid_of_empty_slice_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_averages_coordinates() {
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -2.0)]).unwrap();
        assert_eq!(c, Point3::new(1.0, 2.0, -1.0));
    }

    #[test]
    fn plane_normal_of_xy_hexagon_is_z_axis() {
        let points: Vec<_> = (0..6)
            .map(|i| {
                let t = i as f64 * std::f64::consts::PI / 3.0;
                Point3::new(1.4 * t.cos() + 3.0, 1.4 * t.sin() - 1.0, 2.0)
            })
            .collect();
        let n = plane_normal(&points).unwrap();
        assert_close(n.z.abs(), 1.0);
    }

    #[test]
    fn plane_normal_needs_three_points() {
        assert!(plane_normal(&[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).is_none());
    }

    #[test]
    fn angles_are_measured_in_degrees() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        assert_close(angle_at_deg(&a, &Point3::origin(), &b).unwrap(), 90.0);
        assert!(angle_at_deg(&a, &a, &b).is_none());
        assert_close(fold_to_acute(150.0), 30.0);
        assert_close(fold_to_acute(45.0), 45.0);
    }

    #[test]
    fn in_plane_offset_ignores_height_above_plane() {
        let normal = Unit::new_normalize(Vector3::z());
        let offset = in_plane_offset(&Point3::new(1.5, 0.0, 3.4), &Point3::origin(), &normal);
        assert_close(offset, 1.5);
    }

    #[test]
    fn collinear_triangle_has_no_face_normal() {
        let a = Point3::new(0.0f32, 0.0, 0.0);
        let b = Point3::new(1.0f32, 0.0, 0.0);
        let c = Point3::new(2.0f32, 0.0, 0.0);
        assert!(face_normal(&a, &b, &c).is_none());
        let n = face_normal(&a, &b, &Point3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(n.z > 0.0);
    }
}
