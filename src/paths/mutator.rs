use crate::accel::Acceleration;
use crate::constants;
use crate::geometry::Mesh;
use crate::math;
use crate::paths::path::Path;
use crate::samplers::Sampler;
use crate::scene::Scene;
use crate::structure::Ray;
use cgmath::*;
use std::fmt;

/// Reasons for a mutation to be rejected.
/// A rejected mutation never modifies the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    /// The mutation radius is not strictly positive
    InvalidRadius,
    /// The vertex index is outside the path
    IndexOutOfRange,
    /// The camera or the light vertex cannot be moved
    EndPoint,
    /// The per-vertex arrays of the path disagree on their size
    InconsistentPath,
    EmptyMesh,
    /// Zero area triangle, zero length direction or zero barycentric coordinates
    Degenerate,
    /// The mesh walk reached an edge without neighbour
    BoundaryEdge,
    /// The mesh walk did not terminate
    IterationCap,
    /// The new ray does not hit the mesh
    Miss,
    /// The sampled direction goes below the surface
    BackFacing,
    /// The new vertex is not visible from one of its neighbours
    Occluded,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MutationError::InvalidRadius => "mutation radius must be positive",
            MutationError::IndexOutOfRange => "vertex index out of range",
            MutationError::EndPoint => "end point vertices cannot be mutated",
            MutationError::InconsistentPath => "inconsistent path arrays",
            MutationError::EmptyMesh => "empty mesh",
            MutationError::Degenerate => "degenerate geometry",
            MutationError::BoundaryEdge => "boundary edge reached",
            MutationError::IterationCap => "too many mesh walk iterations",
            MutationError::Miss => "no intersection",
            MutationError::BackFacing => "direction below the surface",
            MutationError::Occluded => "path neighbours not visible",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for MutationError {}

/// Sample paths and move their vertices over the scene surface
pub struct PathMutator<'a> {
    pub scene: &'a Scene,
    pub accel: &'a dyn Acceleration,
    /// Shadow ray bias
    pub vis_eps: f32,
}

impl<'a> PathMutator<'a> {
    pub fn new(scene: &'a Scene, accel: &'a dyn Acceleration) -> PathMutator<'a> {
        PathMutator {
            scene,
            accel,
            vis_eps: 1e-4,
        }
    }

    pub fn visibility_eps(mut self, eps: f32) -> Self {
        self.vis_eps = eps;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        self.accel.mesh()
    }

    /// Direct light visibility from a surface point, with a small offset along the normal
    pub fn light_visibility(&self, p: &Point3<f32>, n: &Vector3<f32>) -> bool {
        let o = p + n * self.vis_eps;
        self.accel.visible(&o, &self.scene.light_pos, self.vis_eps)
    }

    /// Build a path with random diffuse bounces.
    ///
    /// Returns `None` only when the initial direction is degenerate or when the primary ray
    /// misses the scene. If a bounce fails to hit the scene after `retries` attempts,
    /// the path stops there and is connected to the light.
    pub fn sample_path(
        &self,
        max_bounces: usize,
        initial_dir: Vector3<f32>,
        retries: usize,
        sampler: &mut dyn Sampler,
    ) -> Option<Path> {
        let d = math::normalize(initial_dir);
        if math::is_zero(&d) {
            return None;
        }

        let mut path = Path::default();
        path.push_end_point(self.scene.camera.pos);

        let mut its = self.accel.trace(&Ray::new(self.scene.camera.pos, d))?;
        path.push_surface(its.p, its.tri_id, its.bary);
        let mut normals = vec![its.n_s];

        for _ in 1..max_bounces {
            let o = its.p + its.n_s * constants::EPSILON;
            let next = (0..retries).find_map(|_| {
                let d = math::sample_hemisphere_uniform(its.n_s, &mut *sampler);
                if d.dot(its.n_s) <= 0.0 {
                    return None;
                }
                assert_approx_eq!(d.dot(d), 1.0, 0.0001);
                self.accel.trace(&Ray::new(o, d))
            });
            its = match next {
                Some(v) => v,
                None => break,
            };
            path.push_surface(its.p, its.tri_id, its.bary);
            normals.push(its.n_s);
        }
        path.bounces = normals.len();
        path.push_end_point(self.scene.light_pos);

        path.light_visible = (1..path.len() - 1)
            .map(|i| self.light_visibility(&path.vertices[i], &normals[i - 1]))
            .collect();
        Some(path)
    }

    /// Check the path and the vertex before any mutation.
    /// Returns the triangle id of the vertex.
    pub(crate) fn check_vertex(&self, path: &Path, index: usize) -> Result<usize, MutationError> {
        if index >= path.len() {
            return Err(MutationError::IndexOutOfRange);
        }
        if !path.is_consistent() {
            return Err(MutationError::InconsistentPath);
        }
        if self.mesh().is_empty() {
            return Err(MutationError::EmptyMesh);
        }
        if !path.is_interior(index) {
            return Err(MutationError::EndPoint);
        }
        match path.faces[index] {
            Some(tri_id) if tri_id < self.mesh().triangles.len() => Ok(tri_id),
            _ => Err(MutationError::InconsistentPath),
        }
    }

    /// The new position needs to be visible from both neighbours of the vertex
    pub(crate) fn check_neighbours(
        &self,
        path: &Path,
        index: usize,
        p: &Point3<f32>,
    ) -> Result<(), MutationError> {
        if index >= 1 && !self.accel.visible(&path.vertices[index - 1], p, self.vis_eps) {
            return Err(MutationError::Occluded);
        }
        if index + 1 < path.len() && !self.accel.visible(p, &path.vertices[index + 1], self.vis_eps)
        {
            return Err(MutationError::Occluded);
        }
        Ok(())
    }

    /// Write the new vertex inside the path and refresh its light visibility
    pub(crate) fn commit(
        &self,
        path: &mut Path,
        index: usize,
        p: Point3<f32>,
        tri_id: usize,
        bary: Vector3<f32>,
    ) {
        path.vertices[index] = p;
        path.faces[index] = Some(tri_id);
        path.barycentrics[index] = bary;
        let n = self.mesh().triangles[tri_id].shading_normal(&bary);
        path.light_visible[index - 1] = self.light_visibility(&p, &n);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::accel::NaiveAcceleration;
    use crate::camera::Camera;
    use crate::samplers::independent::IndependentSampler;

    /// Closed box [-1, 1]^3 (normals pointing inside), light and camera inside
    pub fn box_scene() -> Scene {
        let positions = vec![
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ];
        let faces: Vec<[u32; 4]> = vec![
            [0, 1, 2, 3], // z = -1
            [4, 7, 6, 5], // z = 1
            [0, 4, 5, 1], // y = -1
            [3, 2, 6, 7], // y = 1
            [0, 3, 7, 4], // x = -1
            [1, 5, 6, 2], // x = 1
        ];
        let indices = faces
            .iter()
            .flat_map(|f| vec![[f[0], f[1], f[2]], [f[0], f[2], f[3]]])
            .collect::<Vec<_>>();
        // Face normals are needed for the shading (no smoothing over the corners)
        let mesh = Mesh::new(positions, vec![], indices);
        let mesh = flat_normals(mesh);
        let camera = Camera::new(
            Point3::new(0.0, 0.0, 0.9),
            -Vector3::unit_z(),
            Vector3::unit_y(),
            1.0,
            0.1,
            Vector2::new(8, 8),
        );
        Scene::new(mesh, camera, Point3::new(0.1, 0.5, 0.0))
    }

    /// Floor [-2, 2]^2 at z = 0 under a ceiling at z = 2, camera and light at z = 1.
    /// The blocker at z = 0.5 hides part of the floor from the camera,
    /// the one at z = 1.5 hides part of the ceiling from the light.
    pub fn occluder_scene() -> Scene {
        let positions = vec![
            // Floor
            Point3::new(-2.0, -2.0, 0.0),
            Point3::new(2.0, -2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(-2.0, 2.0, 0.0),
            // Ceiling
            Point3::new(-4.0, -4.0, 2.0),
            Point3::new(4.0, -4.0, 2.0),
            Point3::new(4.0, 4.0, 2.0),
            Point3::new(-4.0, 4.0, 2.0),
            // Low blocker
            Point3::new(0.4, -1.5, 0.5),
            Point3::new(1.8, -1.5, 0.5),
            Point3::new(1.1, 1.0, 0.5),
            // High blocker
            Point3::new(-0.6, -0.6, 1.5),
            Point3::new(0.6, -0.6, 1.5),
            Point3::new(0.0, 0.8, 1.5),
        ];
        let indices = vec![
            [0, 1, 2],
            [0, 2, 3],
            [4, 6, 5],
            [4, 7, 6],
            [8, 9, 10],
            [11, 12, 13],
        ];
        let mesh = flat_normals(Mesh::new(positions, vec![], indices));
        let camera = Camera::new(
            Point3::new(0.1, -0.3, 1.0),
            -Vector3::unit_z(),
            Vector3::unit_y(),
            1.0,
            0.1,
            Vector2::new(4, 4),
        );
        Scene::new(mesh, camera, Point3::new(-1.5, 1.5, 1.0))
    }

    pub fn flat_normals(mut mesh: Mesh) -> Mesh {
        for t in &mut mesh.triangles {
            let n = t.face_normal();
            t.n = [n, n, n];
        }
        mesh
    }

    #[test]
    fn sampled_paths_are_consistent() {
        let scene = box_scene();
        let accel = NaiveAcceleration::new(&scene.mesh);
        let mutator = PathMutator::new(&scene, &accel);
        let mut sampler = IndependentSampler::from_seed(7);
        for i in 0..50 {
            let d = Vector3::new(
                0.1 * (i % 5) as f32 - 0.23,
                0.05 * (i % 3) as f32 + 0.01,
                -1.0,
            );
            let path = mutator.sample_path(5, d, 8, &mut sampler).unwrap();
            assert!(path.is_consistent());
            // Closed box: every bounce hits something
            assert_eq!(path.len(), 7);
            assert_eq!(path.bounces, 5);
            assert_eq!(path.vertices[0], scene.camera.pos);
            assert_eq!(*path.vertices.last().unwrap(), scene.light_pos);
            assert_eq!(path.faces[0], None);
            assert_eq!(*path.faces.last().unwrap(), None);
            for k in 1..path.len() - 1 {
                let p = path.surface_point(&scene.mesh, k).unwrap();
                assert!((p - path.vertices[k]).magnitude() < 1e-4);
                // Nothing can block the light inside an empty box
                assert!(path.light_visible[k - 1]);
            }
        }
    }

    #[test]
    fn sample_path_failures() {
        let scene = box_scene();
        let accel = NaiveAcceleration::new(&scene.mesh);
        let mutator = PathMutator::new(&scene, &accel);
        let mut sampler = IndependentSampler::from_seed(1);
        assert!(mutator
            .sample_path(4, Vector3::zero(), 8, &mut sampler)
            .is_none());

        let empty = Scene::new(
            Mesh::new(vec![], vec![], vec![]),
            scene.camera.clone(),
            scene.light_pos,
        );
        let accel = NaiveAcceleration::new(&empty.mesh);
        let mutator = PathMutator::new(&empty, &accel);
        assert!(mutator
            .sample_path(4, -Vector3::unit_z(), 8, &mut sampler)
            .is_none());
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let scene = box_scene();
        let accel = NaiveAcceleration::new(&scene.mesh);
        let mutator = PathMutator::new(&scene, &accel);
        let mut sampler = IndependentSampler::from_seed(2);
        let path = mutator
            .sample_path(3, -Vector3::unit_z(), 8, &mut sampler)
            .unwrap();
        assert_eq!(mutator.check_vertex(&path, 0), Err(MutationError::EndPoint));
        assert_eq!(
            mutator.check_vertex(&path, path.len() - 1),
            Err(MutationError::EndPoint)
        );
        assert_eq!(
            mutator.check_vertex(&path, path.len()),
            Err(MutationError::IndexOutOfRange)
        );
        let mut broken = path.clone();
        broken.light_visible.pop();
        assert_eq!(
            mutator.check_vertex(&broken, 1),
            Err(MutationError::InconsistentPath)
        );
        assert!(mutator.check_vertex(&path, 1).is_ok());
    }
}
