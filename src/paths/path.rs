use crate::geometry::Mesh;
use cgmath::*;

/// Light path from the camera (first vertex) to the point light (last vertex).
///
/// `faces` and `barycentrics` are indexed like `vertices`: the two end points
/// do not lie on the mesh and carry `None` and the zero vector.
/// `light_visible` caches the direct light visibility of the interior
/// vertices (`light_visible[i - 1]` for the vertex `i`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<Option<usize>>,
    pub barycentrics: Vec<Vector3<f32>>,
    pub light_visible: Vec<bool>,
    /// Number of surface vertices when the path was sampled
    pub bounces: usize,
}

impl Path {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn nb_interior(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }

    pub fn is_interior(&self, i: usize) -> bool {
        i >= 1 && i + 1 < self.vertices.len()
    }

    /// All the per-vertex arrays have a compatible size
    pub fn is_consistent(&self) -> bool {
        self.faces.len() == self.vertices.len()
            && self.barycentrics.len() == self.vertices.len()
            && self.light_visible.len() == self.nb_interior()
    }

    pub(crate) fn push_end_point(&mut self, p: Point3<f32>) {
        self.vertices.push(p);
        self.faces.push(None);
        self.barycentrics.push(Vector3::zero());
    }

    pub(crate) fn push_surface(&mut self, p: Point3<f32>, tri_id: usize, bary: Vector3<f32>) {
        self.vertices.push(p);
        self.faces.push(Some(tri_id));
        self.barycentrics.push(bary);
    }

    /// Shading normal of the vertex `i` recovered from its face and barycentric coordinates.
    /// Zero for vertices not on the surface or on degenerate triangles.
    pub fn shading_normal(&self, mesh: &Mesh, i: usize) -> Vector3<f32> {
        match self.faces.get(i).copied().flatten() {
            Some(tri_id) => match (mesh.triangles.get(tri_id), self.barycentrics.get(i)) {
                (Some(tri), Some(bary)) => tri.shading_normal(bary),
                _ => Vector3::zero(),
            },
            None => Vector3::zero(),
        }
    }

    /// Position of the vertex `i` recomputed from its face and barycentric coordinates
    pub fn surface_point(&self, mesh: &Mesh, i: usize) -> Option<Point3<f32>> {
        let tri_id = self.faces.get(i).copied().flatten()?;
        let tri = mesh.triangles.get(tri_id)?;
        Some(tri.point(self.barycentrics.get(i)?))
    }
}
