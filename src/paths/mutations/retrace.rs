use crate::constants;
use crate::math;
use crate::paths::mutator::*;
use crate::paths::path::Path;
use crate::samplers::Sampler;
use crate::structure::Ray;
use cgmath::*;

impl<'a> PathMutator<'a> {
    /// Move the vertex `index` to the first hit of a new uniform direction
    /// sampled around the vertex shading normal.
    pub fn mutate_vertex_retrace(
        &self,
        path: &mut Path,
        index: usize,
        sampler: &mut dyn Sampler,
    ) -> Result<(), MutationError> {
        let tri_id = self.check_vertex(path, index)?;
        let bary = path.barycentrics[index];
        if bary.magnitude2() <= 0.0 {
            return Err(MutationError::Degenerate);
        }

        // Position and normal recovered from the barycentric coordinates
        let tri = &self.mesh().triangles[tri_id];
        let p = tri.point(&bary);
        let n = tri.shading_normal(&bary);
        if math::is_zero(&n) {
            return Err(MutationError::Degenerate);
        }

        let d = math::sample_hemisphere_uniform(n, sampler);
        if d.dot(n) <= 0.0 {
            return Err(MutationError::BackFacing);
        }
        let its = self
            .accel
            .trace(&Ray::new(p + n * constants::EPSILON, d))
            .ok_or(MutationError::Miss)?;
        self.check_neighbours(path, index, &its.p)?;
        trace!(
            "retrace: vertex {} moved from triangle {} to {}",
            index,
            tri_id,
            its.tri_id
        );
        self.commit(path, index, its.p, its.tri_id, its.bary);
        Ok(())
    }
}
