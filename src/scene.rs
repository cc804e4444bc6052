use crate::camera::Camera;
use crate::geometry::Mesh;
use crate::structure::AABB;
use cgmath::*;

/// Scene representation
pub struct Scene {
    /// Main camera
    pub camera: Camera,
    pub nb_threads: Option<usize>,
    pub output_img_path: String,
    // Geometry information
    pub mesh: Mesh,
    /// Point light position
    pub light_pos: Point3<f32>,
}

impl Scene {
    pub fn new(mesh: Mesh, camera: Camera, light_pos: Point3<f32>) -> Scene {
        Scene {
            camera,
            nb_threads: None,
            output_img_path: "out.ppm".to_string(),
            mesh,
            light_pos,
        }
    }

    pub fn output_img(mut self, filename: &str) -> Self {
        self.output_img_path = filename.to_string();
        self
    }
    pub fn nb_threads(mut self, n: usize) -> Self {
        self.nb_threads = Some(n);
        self
    }

    /// Light placed at the center of the scene, raised along +Y
    pub fn default_light(aabb: &AABB) -> Point3<f32> {
        let c = aabb.center();
        Point3::new(c.x, c.y + 0.35 * aabb.size().y, c.z)
    }

    /// Length of the bounding box diagonal, 1.0 for a degenerate scene
    pub fn diagonal(&self) -> f32 {
        let d = self.mesh.aabb.diagonal();
        if d > 0.0 {
            d
        } else {
            1.0
        }
    }
}
