use crate::accel::Acceleration;
use crate::integrators::mutation::RenderParams;
use crate::math;
use crate::paths::path::Path;
use crate::scene::Scene;
use crate::structure::Color;
use cgmath::*;
use std::f32::consts::PI;

/// Radiance carried by a camera path toward the camera.
///
/// Every interior vertex is connected to the point light (next event estimation)
/// and the throughput is updated with the diffuse BSDF over the uniform hemisphere pdf
/// used by the path sampler. The light visibility cached inside the path is used when
/// its size is valid, otherwise a shadow ray is traced.
pub fn compute_radiance(
    path: &Path,
    scene: &Scene,
    accel: &dyn Acceleration,
    params: &RenderParams,
) -> Color {
    let n_vertices = path.len();
    if n_vertices < 3 {
        return Color::zero();
    }
    let use_cache = path.light_visible.len() == path.nb_interior();

    let f_lam = params.albedo / PI;
    let mut l_i = Color::zero();
    let mut throughput = Color::one();
    for i in 1..n_vertices - 1 {
        let p = path.vertices[i];
        let n = path.shading_normal(&scene.mesh, i);
        if math::is_zero(&n) {
            return l_i;
        }

        // Direct lighting
        let to_light = scene.light_pos - p;
        let dist2 = to_light.magnitude2();
        if dist2 > 1e-12 {
            let cos_light = n.dot(to_light / dist2.sqrt()).max(0.0);
            if cos_light > 0.0 {
                let visible = if use_cache {
                    path.light_visible[i - 1]
                } else {
                    let o = p + n * params.visibility_eps;
                    accel.visible(&o, &scene.light_pos, params.visibility_eps)
                };
                if visible {
                    l_i += throughput * f_lam * (params.light_intensity / dist2) * cos_light;
                }
            }
        }

        // Continue to the next surface vertex
        if i + 2 < n_vertices {
            let d = math::normalize(path.vertices[i + 1] - p);
            if math::is_zero(&d) {
                break;
            }
            let cos_out = n.dot(d).max(0.0);
            if cos_out <= 0.0 {
                break;
            }
            throughput *= f_lam * (cos_out / math::UNIFORM_HEMISPHERE_PDF);
        }
    }
    l_i
}
