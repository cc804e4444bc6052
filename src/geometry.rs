use crate::math;
use crate::structure::*;
use cgmath::*;
use std::collections::HashMap;

/// Link toward the triangle sharing one of the edges
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjacency {
    /// Id of the neighbour triangle
    pub tri_id: usize,
    /// Local edge index inside the neighbour triangle
    pub edge: usize,
}

#[derive(Clone, Debug)]
pub struct Triangle {
    pub v: [Point3<f32>; 3],
    /// Per-vertex shading normals
    pub n: [Vector3<f32>; 3],
    /// Global vertex indices
    pub indices: [u32; 3],
    /// Edge e goes from v[e] to v[(e + 1) % 3]
    pub adjacency: [Option<Adjacency>; 3],
}

impl Triangle {
    pub fn edge_endpoints(&self, e: usize) -> (Point3<f32>, Point3<f32>) {
        match e {
            0 => (self.v[0], self.v[1]),
            1 => (self.v[1], self.v[2]),
            _ => (self.v[2], self.v[0]),
        }
    }

    pub fn edge_indices(&self, e: usize) -> (u32, u32) {
        (self.indices[e], self.indices[(e + 1) % 3])
    }

    /// Normalized geometric normal (zero if degenerate)
    pub fn face_normal(&self) -> Vector3<f32> {
        math::normalize((self.v[1] - self.v[0]).cross(self.v[2] - self.v[0]))
    }

    pub fn point(&self, bary: &Vector3<f32>) -> Point3<f32> {
        Point3::from_vec(
            self.v[0].to_vec() * bary.x + self.v[1].to_vec() * bary.y + self.v[2].to_vec() * bary.z,
        )
    }

    /// Interpolated shading normal, with a fallback to the geometric normal.
    /// Returns the zero vector if both are degenerate.
    pub fn shading_normal(&self, bary: &Vector3<f32>) -> Vector3<f32> {
        let n = self.n[0] * bary.x + self.n[1] * bary.y + self.n[2] * bary.z;
        if n.magnitude2() > 0.0 {
            math::normalize(n)
        } else {
            self.face_normal()
        }
    }

    pub fn intersection(&self, r: &Ray) -> Option<(f32, f32, f32)> {
        math::intersect_ray_triangle(
            &r.o,
            &r.d,
            &self.v[0],
            &self.v[1],
            &self.v[2],
            math::DET_EPSILON,
        )
    }
}

/// Triangle soup with the edge connectivity
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub aabb: AABB,
}

fn edge_key(a: u32, b: u32) -> u64 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    ((hi as u64) << 32) | lo as u64
}

impl Mesh {
    /// Build the mesh from indexed positions.
    /// `normals` can be empty, in this case smooth normals are computed
    pub fn new(
        positions: Vec<Point3<f32>>,
        normals: Vec<Vector3<f32>>,
        indices: Vec<[u32; 3]>,
    ) -> Mesh {
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            if !normals.is_empty() {
                warn!(
                    "Normal count mismatch ({} normals for {} positions), recompute them",
                    normals.len(),
                    positions.len()
                );
            }
            Mesh::smooth_normals(&positions, &indices)
        };

        let aabb = positions
            .iter()
            .fold(AABB::default(), |aabb, p| aabb.union_vec(&p.to_vec()));

        let triangles = indices
            .iter()
            .map(|id| Triangle {
                v: [
                    positions[id[0] as usize],
                    positions[id[1] as usize],
                    positions[id[2] as usize],
                ],
                n: [
                    normals[id[0] as usize],
                    normals[id[1] as usize],
                    normals[id[2] as usize],
                ],
                indices: *id,
                adjacency: [None; 3],
            })
            .collect::<Vec<_>>();

        let mut mesh = Mesh { triangles, aabb };
        mesh.build_adjacency();
        mesh
    }

    /// Area weighted vertex normals
    fn smooth_normals(positions: &[Point3<f32>], indices: &[[u32; 3]]) -> Vec<Vector3<f32>> {
        let mut normals = vec![Vector3::zero(); positions.len()];
        for id in indices {
            let (p0, p1, p2) = (
                positions[id[0] as usize],
                positions[id[1] as usize],
                positions[id[2] as usize],
            );
            let n = (p1 - p0).cross(p2 - p0);
            for i in id {
                normals[*i as usize] += n;
            }
        }
        normals.into_iter().map(math::normalize).collect()
    }

    /// Link the triangles sharing an edge.
    /// Only the first pair of triangles seen on an edge is linked,
    /// other triangles on a non-manifold edge stay unconnected.
    fn build_adjacency(&mut self) {
        let mut edges: HashMap<u64, (usize, usize)> =
            HashMap::with_capacity(self.triangles.len() * 3 / 2);
        for tri_id in 0..self.triangles.len() {
            for e in 0..3 {
                let (a, b) = self.triangles[tri_id].edge_indices(e);
                let key = edge_key(a, b);
                let (other_id, other_e) = match edges.get(&key).copied() {
                    None => {
                        edges.insert(key, (tri_id, e));
                        continue;
                    }
                    Some(v) => v,
                };
                if other_id == tri_id || self.triangles[other_id].adjacency[other_e].is_some() {
                    continue;
                }
                self.triangles[other_id].adjacency[other_e] = Some(Adjacency { tri_id, edge: e });
                self.triangles[tri_id].adjacency[e] = Some(Adjacency {
                    tri_id: other_id,
                    edge: other_e,
                });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn nb_boundary_edges(&self) -> usize {
        self.triangles
            .iter()
            .map(|t| t.adjacency.iter().filter(|a| a.is_none()).count())
            .sum()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Flat quad [-1, 1]^2 (z = 0) split into 4 triangles around its center
    pub fn fan_quad() -> Mesh {
        let positions = vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let indices = vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
        Mesh::new(positions, vec![], indices)
    }

    #[test]
    fn adjacency_is_symmetric() {
        let mesh = fan_quad();
        let mut nb_links = 0;
        for (tri_id, t) in mesh.triangles.iter().enumerate() {
            for e in 0..3 {
                if let Some(adj) = t.adjacency[e] {
                    nb_links += 1;
                    let other = &mesh.triangles[adj.tri_id];
                    assert_eq!(
                        other.adjacency[adj.edge],
                        Some(Adjacency { tri_id, edge: e })
                    );
                    // Same endpoints, whatever the orientation
                    let (a, b) = t.edge_indices(e);
                    let (c, d) = other.edge_indices(adj.edge);
                    assert_eq!(edge_key(a, b), edge_key(c, d));
                }
            }
        }
        assert_eq!(nb_links, 8);
        assert_eq!(mesh.nb_boundary_edges(), 4);
    }

    #[test]
    fn non_manifold_edge_only_links_first_pair() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let indices = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let mesh = Mesh::new(positions, vec![], indices);
        assert_eq!(
            mesh.triangles[0].adjacency[0],
            Some(Adjacency { tri_id: 1, edge: 0 })
        );
        assert_eq!(
            mesh.triangles[1].adjacency[0],
            Some(Adjacency { tri_id: 0, edge: 0 })
        );
        assert_eq!(mesh.triangles[2].adjacency[0], None);
    }

    #[test]
    fn smooth_normals_and_bounds() {
        let mesh = fan_quad();
        for t in &mesh.triangles {
            for n in t.n.iter() {
                assert_approx_eq!(n.z, 1.0, 1e-6);
            }
            assert_approx_eq!(t.face_normal().z, 1.0, 1e-6);
        }
        assert_approx_eq!(mesh.aabb.diagonal(), 8.0f32.sqrt(), 1e-5);
    }

    #[test]
    fn barycentric_point_and_normal() {
        let mesh = fan_quad();
        let t = &mesh.triangles[0];
        let bary = Vector3::new(0.2, 0.3, 0.5);
        let p = t.point(&bary);
        let back = math::barycentric_of(&p, &t.v[0], &t.v[1], &t.v[2]).unwrap();
        assert!((back - bary).magnitude() < 1e-5);
        assert_approx_eq!(t.shading_normal(&bary).z, 1.0, 1e-6);
    }
}
