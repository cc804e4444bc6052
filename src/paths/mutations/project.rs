use crate::constants;
use crate::math;
use crate::paths::mutator::*;
use crate::paths::path::Path;
use crate::samplers::Sampler;
use crate::structure::Ray;
use cgmath::*;

impl<'a> PathMutator<'a> {
    /// Move the vertex `index` by casting a ray from a point above the surface
    /// toward a random point of the tangent disk of size `radius`.
    /// The new vertex is the first hit, which can lie on any triangle.
    pub fn mutate_vertex_project(
        &self,
        path: &mut Path,
        index: usize,
        radius: f32,
        sampler: &mut dyn Sampler,
    ) -> Result<(), MutationError> {
        if radius <= 0.0 {
            return Err(MutationError::InvalidRadius);
        }
        let tri_id = self.check_vertex(path, index)?;
        let n = self.mesh().triangles[tri_id].face_normal();
        if math::is_zero(&n) {
            return Err(MutationError::Degenerate);
        }

        let p = path.vertices[index];
        let apex = p + n * (0.5 * radius).max(1e-3);
        let (du, dv) = math::sample_disk_polar(sampler.next2d(), radius);
        let (tu, tv) = math::Frame::new(n).tangents();
        let target = p + tu * du + tv * dv;

        let d = math::normalize(target - apex);
        if math::is_zero(&d) {
            return Err(MutationError::Degenerate);
        }
        if d.dot(n) >= -1e-6 {
            return Err(MutationError::BackFacing);
        }

        let its = self
            .accel
            .trace(&Ray::new(apex + d * constants::EPSILON, d))
            .ok_or(MutationError::Miss)?;
        self.check_neighbours(path, index, &its.p)?;
        trace!(
            "project: vertex {} moved from triangle {} to {}",
            index,
            tri_id,
            its.tri_id
        );
        self.commit(path, index, its.p, its.tri_id, its.bary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::{Acceleration, NaiveAcceleration};
    use crate::paths::mutator::tests::{box_scene, occluder_scene};
    use crate::samplers::independent::IndependentSampler;

    #[test]
    fn project_keeps_neighbours_visible() {
        let scene = box_scene();
        let accel = NaiveAcceleration::new(&scene.mesh);
        let mutator = PathMutator::new(&scene, &accel);
        let mut sampler = IndependentSampler::from_seed(17);
        let mut nb_accepted = 0;
        for _ in 0..30 {
            let path = mutator
                .sample_path(3, Vector3::new(-0.11, 0.21, -1.0), 8, &mut sampler)
                .unwrap();
            for index in 1..path.len() - 1 {
                let mut proposal = path.clone();
                match mutator.mutate_vertex_project(&mut proposal, index, 0.3, &mut sampler) {
                    Ok(()) => {
                        nb_accepted += 1;
                        assert!(proposal.is_consistent());
                        let p = proposal.vertices[index];
                        assert!(accel.visible(&proposal.vertices[index - 1], &p, 1e-4));
                        assert!(accel.visible(&p, &proposal.vertices[index + 1], 1e-4));
                        let q = proposal.surface_point(&scene.mesh, index).unwrap();
                        assert!((q - p).magnitude() < 1e-3);
                        for k in (0..path.len()).filter(|k| *k != index) {
                            assert_eq!(proposal.vertices[k], path.vertices[k]);
                        }
                    }
                    Err(_) => assert_eq!(proposal.vertices, path.vertices),
                }
            }
        }
        assert!(nb_accepted > 0);
    }

    #[test]
    fn project_rejects_occluded_points() {
        let scene = occluder_scene();
        let accel = NaiveAcceleration::new(&scene.mesh);
        let mutator = PathMutator::new(&scene, &accel);
        let mut sampler = IndependentSampler::from_seed(29);
        let path = mutator
            .sample_path(1, -Vector3::unit_z(), 1, &mut sampler)
            .unwrap();
        assert_eq!(path.faces[1].map(|f| f < 2), Some(true));

        let (mut nb_accepted, mut nb_occluded) = (0, 0);
        for _ in 0..300 {
            let mut proposal = path.clone();
            match mutator.mutate_vertex_project(&mut proposal, 1, 1.5, &mut sampler) {
                Ok(()) => nb_accepted += 1,
                Err(e) => {
                    assert_eq!(e, MutationError::Occluded);
                    assert_eq!(proposal, path);
                    nb_occluded += 1;
                }
            }
        }
        assert!(nb_accepted > 0);
        assert!(nb_occluded > 0);
    }

    #[test]
    fn project_rejects_bad_input() {
        let scene = box_scene();
        let accel = NaiveAcceleration::new(&scene.mesh);
        let mutator = PathMutator::new(&scene, &accel);
        let mut sampler = IndependentSampler::from_seed(4);
        let mut path = mutator
            .sample_path(2, -Vector3::unit_z(), 8, &mut sampler)
            .unwrap();
        assert_eq!(
            mutator.mutate_vertex_project(&mut path, 1, -1.0, &mut sampler),
            Err(MutationError::InvalidRadius)
        );
        assert_eq!(
            mutator.mutate_vertex_project(&mut path, 10, 0.1, &mut sampler),
            Err(MutationError::IndexOutOfRange)
        );
        let last = path.len() - 1;
        assert_eq!(
            mutator.mutate_vertex_project(&mut path, last, 0.1, &mut sampler),
            Err(MutationError::EndPoint)
        );
    }
}
