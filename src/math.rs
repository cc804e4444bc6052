use crate::samplers::Sampler;
use cgmath::*;
use std;

/// Density (solid angle) of `sample_hemisphere_uniform`
pub const UNIFORM_HEMISPHERE_PDF: f32 = 1.0 / (2.0 * std::f32::consts::PI);

/// Default threshold used to reject parallel rays in `intersect_ray_triangle`
pub const DET_EPSILON: f32 = 1e-8;

/// Normalize a vector, returning the zero vector
/// when the input has no length.
pub fn normalize(v: Vector3<f32>) -> Vector3<f32> {
    let len2 = v.magnitude2();
    if len2 <= 0.0 {
        Vector3::zero()
    } else {
        v / len2.sqrt()
    }
}

pub fn is_zero(v: &Vector3<f32>) -> bool {
    v.magnitude2() <= 0.0
}

/// Build two unit vectors (u, v) completing a right-handed frame with `w`.
/// The helper axis is world-X, unless `w` is too close to it.
pub fn orthonormal_basis(w: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let a = if w.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let u = normalize(a.cross(w));
    let v = w.cross(u);
    (u, v)
}

pub struct Frame {
    m: Matrix3<f32>,
}

impl Frame {
    pub fn new(n: Vector3<f32>) -> Frame {
        let (u, v) = orthonormal_basis(n);
        Frame {
            m: Matrix3 { x: u, y: v, z: n },
        }
    }
    pub fn to_world(&self, v: Vector3<f32>) -> Vector3<f32> {
        self.m.x * v.x + self.m.y * v.y + self.m.z * v.z
    }
    /// Tangent vectors of the frame
    pub fn tangents(&self) -> (Vector3<f32>, Vector3<f32>) {
        (self.m.x, self.m.y)
    }
}

/// Moller-Trumbore ray/triangle test.
/// Returns the distance along the ray and the two free barycentric coordinates (u, v),
/// the third one being `w = 1 - u - v`.
pub fn intersect_ray_triangle(
    o: &Point3<f32>,
    d: &Vector3<f32>,
    v0: &Point3<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
    eps: f32,
) -> Option<(f32, f32, f32)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let pvec = d.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < eps {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = o - v0;
    let u = tvec.dot(pvec) * inv_det;
    if u < 0.0 || u > 1.0 {
        return None;
    }

    let qvec = tvec.cross(e1);
    let v = d.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(qvec) * inv_det;
    if t <= 0.0 {
        return None;
    }
    Some((t, u, v))
}

/// Uniform direction over the hemisphere around `n`.
/// The pdf is constant: `UNIFORM_HEMISPHERE_PDF`.
pub fn sample_hemisphere_uniform(n: Vector3<f32>, sampler: &mut dyn Sampler) -> Vector3<f32> {
    let u = sampler.next2d();
    let z = u.x;
    let phi = 2.0 * std::f32::consts::PI * u.y;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let local = Vector3::new(r * phi.cos(), r * phi.sin(), z);

    let mut w = normalize(n);
    if is_zero(&w) {
        w = Vector3::unit_y();
    }
    normalize(Frame::new(w).to_world(local))
}

/// Uniform point inside a disk of radius `radius` (polar mapping)
pub fn sample_disk_polar(u: Point2<f32>, radius: f32) -> (f32, f32) {
    let rho = u.x.sqrt() * radius;
    let phi = 2.0 * std::f32::consts::PI * u.y;
    (rho * phi.cos(), rho * phi.sin())
}

pub fn project_to_plane(d: Vector3<f32>, n: Vector3<f32>) -> Vector3<f32> {
    d - n * d.dot(n)
}

/// Rotate `x` by `theta` around the unit axis `k`
pub fn rodrigues(x: Vector3<f32>, k: Vector3<f32>, theta: f32) -> Vector3<f32> {
    let (s, c) = theta.sin_cos();
    x * c + k.cross(x) * s + k * k.dot(x) * (1.0 - c)
}

/// Angle between the two normals around the edge axis `e`, in [-pi, pi].
/// Rotating by this angle around `e` brings `n0` onto `n1`.
pub fn signed_dihedral(n0: Vector3<f32>, n1: Vector3<f32>, e: Vector3<f32>) -> f32 {
    let c = n0.dot(n1).max(-1.0).min(1.0);
    let theta = c.acos();
    if e.dot(n0.cross(n1)) < 0.0 {
        -theta
    } else {
        theta
    }
}

pub fn cross2(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Barycentric coordinates (w, u, v) of `p` relative to the triangle (a, b, c).
/// The point is implicitly projected on the triangle plane.
pub fn barycentric_of(
    p: &Point3<f32>,
    a: &Point3<f32>,
    b: &Point3<f32>,
    c: &Point3<f32>,
) -> Option<Vector3<f32>> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= 1e-12 {
        return None;
    }
    let inv_denom = 1.0 / denom;
    let u = (d11 * d20 - d01 * d21) * inv_denom;
    let v = (d00 * d21 - d01 * d20) * inv_denom;
    Some(Vector3::new(1.0 - u - v, u, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samplers::independent::IndependentSampler;

    #[test]
    fn normalize_zero() {
        assert_eq!(normalize(Vector3::zero()), Vector3::zero());
        let v = normalize(Vector3::new(3.0, 0.0, 4.0));
        assert_approx_eq!(v.magnitude(), 1.0, 1e-6);
    }

    #[test]
    fn basis_is_orthonormal() {
        let dirs = [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-0.95, 0.1, 0.0).normalize(),
            Vector3::new(0.3, -0.4, 0.5).normalize(),
        ];
        for w in dirs.iter() {
            let (u, v) = orthonormal_basis(*w);
            assert_approx_eq!(u.magnitude(), 1.0, 1e-5);
            assert_approx_eq!(v.magnitude(), 1.0, 1e-5);
            assert_approx_eq!(u.dot(*w), 0.0, 1e-5);
            assert_approx_eq!(v.dot(*w), 0.0, 1e-5);
            assert_approx_eq!(u.dot(v), 0.0, 1e-5);
            // Right handed
            assert_approx_eq!(u.cross(v).dot(*w), 1.0, 1e-5);
        }
    }

    #[test]
    fn ray_triangle_barycentric_consistency() {
        let v0 = Point3::new(-1.0, -1.0, 0.0);
        let v1 = Point3::new(2.0, -0.5, 0.3);
        let v2 = Point3::new(0.0, 1.5, -0.2);
        let mut sampler = IndependentSampler::from_seed(3);
        let mut nb_hits = 0;
        for _ in 0..200 {
            let o = Point3::new(
                sampler.next() * 2.0 - 1.0,
                sampler.next() * 2.0 - 1.0,
                3.0,
            );
            let target = Point3::new(sampler.next() - 0.5, sampler.next() - 0.5, 0.0);
            let d = (target - o).normalize();
            if let Some((t, u, v)) = intersect_ray_triangle(&o, &d, &v0, &v1, &v2, DET_EPSILON) {
                nb_hits += 1;
                let w = 1.0 - u - v;
                assert_approx_eq!(w + u + v, 1.0, 1e-6);
                assert!(t > 0.0);
                let p_bary = v0.to_vec() * w + v1.to_vec() * u + v2.to_vec() * v;
                let p_ray = (o + d * t).to_vec();
                assert!((p_bary - p_ray).magnitude() < 1e-4);
            }
        }
        assert!(nb_hits > 0);
    }

    #[test]
    fn ray_triangle_rejections() {
        let v0 = Point3::new(0.0, 0.0, 0.0);
        let v1 = Point3::new(1.0, 0.0, 0.0);
        let v2 = Point3::new(0.0, 1.0, 0.0);
        // Parallel
        let o = Point3::new(0.2, 0.2, 1.0);
        assert!(intersect_ray_triangle(&o, &Vector3::unit_x(), &v0, &v1, &v2, DET_EPSILON).is_none());
        // Behind
        assert!(intersect_ray_triangle(&o, &Vector3::unit_z(), &v0, &v1, &v2, DET_EPSILON).is_none());
        // Outside
        let o = Point3::new(0.8, 0.8, 1.0);
        assert!(
            intersect_ray_triangle(&o, &-Vector3::unit_z(), &v0, &v1, &v2, DET_EPSILON).is_none()
        );
    }

    #[test]
    fn hemisphere_samples_stay_above() {
        let n = Vector3::new(0.2, 0.9, -0.1).normalize();
        let mut sampler = IndependentSampler::from_seed(42);
        for _ in 0..1000 {
            let d = sample_hemisphere_uniform(n, &mut sampler);
            assert_approx_eq!(d.magnitude(), 1.0, 1e-4);
            assert!(d.dot(n) >= -1e-5);
        }
    }

    #[test]
    fn dihedral_transport() {
        // Floor (normal +Z) folded up along the Y axis into a wall (normal -X)
        let n0 = Vector3::unit_z();
        let n1 = -Vector3::unit_x();
        let axis = Vector3::unit_y();
        let theta = signed_dihedral(n0, n1, axis);
        assert_approx_eq!(theta.abs(), std::f32::consts::FRAC_PI_2, 1e-5);
        // Rotating the first normal lands on the second one
        let n = rodrigues(n0, axis, theta);
        assert!((n - n1).magnitude() < 1e-5);
        // A direction travelling +X on the floor ends up climbing the wall
        let d = rodrigues(Vector3::unit_x(), axis, theta);
        assert_approx_eq!(d.dot(n1), 0.0, 1e-5);
        assert!((d - Vector3::unit_z()).magnitude() < 1e-5);
        // Reversed axis flips the sign
        assert_approx_eq!(signed_dihedral(n0, n1, -axis), -theta, 1e-6);
    }

    #[test]
    fn projection_and_cross2() {
        let n = Vector3::unit_z();
        let d = project_to_plane(Vector3::new(1.0, 2.0, 3.0), n);
        assert_approx_eq!(d.z, 0.0, 1e-6);
        assert_approx_eq!(cross2(Vector2::unit_x(), Vector2::unit_y()), 1.0, 1e-6);
        assert_approx_eq!(cross2(Vector2::unit_y(), Vector2::unit_x()), -1.0, 1e-6);
    }

    #[test]
    fn barycentric_degenerate() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(barycentric_of(&Point3::new(0.5, 0.0, 0.0), &a, &b, &c).is_none());
        let c = Point3::new(0.0, 1.0, 0.0);
        let bary = barycentric_of(&Point3::new(0.25, 0.5, 0.0), &a, &b, &c).unwrap();
        assert_approx_eq!(bary.x, 0.25, 1e-6);
        assert_approx_eq!(bary.y, 0.25, 1e-6);
        assert_approx_eq!(bary.z, 0.5, 1e-6);
    }
}
