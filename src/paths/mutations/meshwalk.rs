use crate::math;
use crate::paths::mutator::*;
use crate::paths::path::Path;
use crate::samplers::Sampler;
use cgmath::*;

const WALK_EPSILON: f32 = 1e-6;
/// Tolerance on the barycentric coordinates of the final point
const BARY_EPSILON: f32 = 1e-4;
/// Guard against cycles inside a malformed adjacency
const WALK_MAX_STEPS: usize = 100_000;

impl<'a> PathMutator<'a> {
    /// Move the vertex `index` along the surface by a geodesic distance
    /// up to `radius`, in a random tangent direction.
    ///
    /// The walk goes from triangle to triangle: when the straight line
    /// inside the current triangle crosses an edge, the remaining direction
    /// is rotated around this edge to lie in the neighbour triangle plane.
    pub fn mutate_vertex_meshwalk(
        &self,
        path: &mut Path,
        index: usize,
        radius: f32,
        sampler: &mut dyn Sampler,
    ) -> Result<(), MutationError> {
        if radius <= 0.0 {
            return Err(MutationError::InvalidRadius);
        }
        let mut tri_id = self.check_vertex(path, index)?;
        let triangles = &self.mesh().triangles;

        let n = triangles[tri_id].face_normal();
        if math::is_zero(&n) {
            return Err(MutationError::Degenerate);
        }
        let (du, dv) = math::sample_disk_polar(sampler.next2d(), radius);
        let (tu, tv) = math::Frame::new(n).tangents();
        let step = tu * du + tv * dv;
        let mut remaining = step.magnitude();
        if remaining <= WALK_EPSILON {
            // Nothing to do, the vertex stays in place
            return Ok(());
        }

        let mut p = path.vertices[index];
        let mut d = math::normalize(step);
        let mut nb_steps = 0;
        while remaining > WALK_EPSILON {
            nb_steps += 1;
            if nb_steps > WALK_MAX_STEPS {
                return Err(MutationError::IterationCap);
            }

            let tri = &triangles[tri_id];
            let n0 = tri.face_normal();
            if math::is_zero(&n0) {
                return Err(MutationError::Degenerate);
            }
            d = math::normalize(math::project_to_plane(d, n0));
            if math::is_zero(&d) {
                return Err(MutationError::Degenerate);
            }

            // 2D frame of the triangle plane
            let e1 = tri.v[1] - tri.v[0];
            if e1.magnitude2() <= WALK_EPSILON * WALK_EPSILON {
                return Err(MutationError::Degenerate);
            }
            let u = math::normalize(e1);
            let v = n0.cross(u);
            let to_2d = |x: &Point3<f32>| {
                let r = x - tri.v[0];
                Vector2::new(r.dot(u), r.dot(v))
            };
            let p2 = to_2d(&p);
            let r2 = Vector2::new(d.dot(u), d.dot(v));
            if r2.magnitude2() <= WALK_EPSILON * WALK_EPSILON {
                return Err(MutationError::Degenerate);
            }

            // Closest edge crossed by the segment [p, p + remaining * d]
            let mut best: Option<(usize, f32)> = None;
            for e in 0..3 {
                let (a, b) = tri.edge_endpoints(e);
                let a2 = to_2d(&a);
                let e2 = to_2d(&b) - a2;
                let denom = math::cross2(r2, e2);
                if denom.abs() < WALK_EPSILON {
                    continue;
                }
                let ap = a2 - p2;
                let s = math::cross2(ap, e2) / denom;
                let t = math::cross2(ap, r2) / denom;
                if s > WALK_EPSILON
                    && s <= remaining + WALK_EPSILON
                    && t >= -WALK_EPSILON
                    && t <= 1.0 + WALK_EPSILON
                    && best.map_or(true, |(_, s_best)| s < s_best)
                {
                    best = Some((e, s));
                }
            }

            let (edge, s) = match best {
                Some(v) => v,
                None => {
                    // The end point is inside the current triangle
                    p += d * remaining;
                    break;
                }
            };
            p += d * s;
            remaining -= s;

            // Cross the edge
            let adj = tri.adjacency[edge].ok_or(MutationError::BoundaryEdge)?;
            let next = triangles
                .get(adj.tri_id)
                .ok_or(MutationError::InconsistentPath)?;
            let mut n1 = next.face_normal();
            if math::is_zero(&n1) {
                return Err(MutationError::Degenerate);
            }
            // Consistent winding runs the shared edge in opposite directions
            if next.edge_indices(adj.edge) == tri.edge_indices(edge) {
                n1 = -n1;
            }
            let (a, b) = tri.edge_endpoints(edge);
            let axis = math::normalize(b - a);
            if math::is_zero(&axis) {
                return Err(MutationError::Degenerate);
            }
            let theta = math::signed_dihedral(n0, n1, axis);
            d = math::normalize(math::project_to_plane(
                math::rodrigues(d, axis, theta),
                n1,
            ));
            if math::is_zero(&d) {
                return Err(MutationError::Degenerate);
            }
            p += d * WALK_EPSILON;
            tri_id = adj.tri_id;
        }

        let tri = &triangles[tri_id];
        let bary = math::barycentric_of(&p, &tri.v[0], &tri.v[1], &tri.v[2])
            .ok_or(MutationError::Degenerate)?;
        if (0..3).any(|i| bary[i] < -BARY_EPSILON || bary[i] > 1.0 + BARY_EPSILON) {
            return Err(MutationError::Degenerate);
        }
        trace!(
            "meshwalk: vertex {} moved to triangle {} ({} steps)",
            index,
            tri_id,
            nb_steps
        );
        self.commit(path, index, p, tri_id, bary);
        Ok(())
    }
}
