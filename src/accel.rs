use crate::geometry::Mesh;
use crate::math;
use crate::structure::*;
use cgmath::*;

pub trait Acceleration: Sync + Send {
    fn mesh(&self) -> &Mesh;
    /// Closest hit along the ray (inside [tnear, tfar])
    fn trace(&self, ray: &Ray) -> Option<Intersection>;

    /// Check that nothing blocks the ray before `t_target - eps`
    fn visible_along_ray(
        &self,
        o: &Point3<f32>,
        d: &Vector3<f32>,
        t_target: f32,
        eps: f32,
    ) -> bool {
        if t_target <= 0.0 {
            return true;
        }
        match self.trace(&Ray::new(*o, *d)) {
            None => true,
            Some(its) => its.dist >= t_target - eps,
        }
    }

    fn visible(&self, p0: &Point3<f32>, p1: &Point3<f32>, eps: f32) -> bool {
        let d = p1 - p0;
        let dist2 = d.magnitude2();
        if dist2 <= 0.0 {
            return true;
        }
        let dist = dist2.sqrt();
        self.visible_along_ray(p0, &(d / dist), dist, eps)
    }
}

/// Exhaustive intersection over all the triangles of the mesh
pub struct NaiveAcceleration<'scene> {
    pub mesh: &'scene Mesh,
}
impl<'scene> NaiveAcceleration<'scene> {
    pub fn new(mesh: &'scene Mesh) -> NaiveAcceleration<'scene> {
        NaiveAcceleration { mesh }
    }
}
impl<'a> Acceleration for NaiveAcceleration<'a> {
    fn mesh(&self) -> &Mesh {
        self.mesh
    }

    fn trace(&self, ray: &Ray) -> Option<Intersection> {
        let mut best: Option<(usize, f32, f32, f32)> = None;
        for (i, tri) in self.mesh.triangles.iter().enumerate() {
            let (t, u, v) = match tri.intersection(ray) {
                Some(x) => x,
                None => continue,
            };
            if t < ray.tnear || t > ray.tfar {
                continue;
            }
            if best.map_or(true, |(_, t_best, _, _)| t < t_best) {
                best = Some((i, t, u, v));
            }
        }

        let (tri_id, t, u, v) = best?;
        let tri = &self.mesh.triangles[tri_id];
        let bary = Vector3::new(1.0 - u - v, u, v);
        let n_s = tri.shading_normal(&bary);
        Some(Intersection {
            dist: t,
            p: ray.o + ray.d * t,
            n_s: math::normalize(n_s),
            bary,
            tri_id,
        })
    }
}
