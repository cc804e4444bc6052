use crate::math;
use crate::structure::{Ray, AABB};
use cgmath::*;

/// Pinhole camera
#[derive(Clone, Debug)]
pub struct Camera {
    pub pos: Point3<f32>,
    pub dir: Vector3<f32>,
    pub up: Vector3<f32>,
    pub focal_length: f32,
    pub pixel_size: f32,
    pub img: Vector2<u32>,
    // Internally
    right: Vector3<f32>,
    screen_up: Vector3<f32>,
}

impl Camera {
    pub fn new(
        pos: Point3<f32>,
        dir: Vector3<f32>,
        up: Vector3<f32>,
        focal_length: f32,
        pixel_size: f32,
        img: Vector2<u32>,
    ) -> Camera {
        let mut dir = math::normalize(dir);
        if math::is_zero(&dir) {
            warn!("Degenerated camera direction, use +Z");
            dir = Vector3::unit_z();
        }
        let up = if math::is_zero(&up) {
            Vector3::unit_y()
        } else {
            up
        };
        let mut right = math::normalize(dir.cross(up));
        if math::is_zero(&right) {
            right = math::normalize(dir.cross(Vector3::unit_z()));
            if math::is_zero(&right) {
                right = Vector3::unit_x();
            }
        }
        let screen_up = right.cross(dir);
        Camera {
            pos,
            dir,
            up,
            focal_length,
            pixel_size,
            img,
            right,
            screen_up,
        }
    }

    /// Camera above the scene (+Z) looking down -Z
    /// and covering the scene extent.
    pub fn framing(aabb: &AABB, img: Vector2<u32>) -> Camera {
        let diag = if aabb.diagonal() > 0.0 {
            aabb.diagonal()
        } else {
            1.0
        };
        let center = aabb.center();
        let pos = Point3::new(center.x, center.y, aabb.p_max.z + 0.5 * diag);
        Camera::new(
            pos,
            -Vector3::unit_z(),
            Vector3::unit_y(),
            diag,
            diag / img.x as f32,
            img,
        )
    }

    pub fn size(&self) -> &Vector2<u32> {
        &self.img
    }

    pub fn scale_image(&mut self, s: f32) {
        self.img = Vector2::new(
            (s * self.img.x as f32) as u32,
            (s * self.img.y as f32) as u32,
        );
        self.pixel_size /= s;
    }

    pub fn print_info(&self) {
        info!(" - Position: {:?}", self.pos);
        info!(" - Direction: {:?}", self.dir);
        info!(" - Focal length: {:?}", self.focal_length);
        info!(" - Pixel size: {:?}", self.pixel_size);
        info!(" - Image size: {:?}", self.img);
    }

    /// Primary ray going through the center of the pixel
    pub fn generate(&self, (px, py): (u32, u32)) -> Ray {
        let cx = self.img.x as f32 * 0.5;
        let cy = self.img.y as f32 * 0.5;
        let x = (px as f32 + 0.5 - cx) * self.pixel_size;
        let y = (cy - (py as f32 + 0.5)) * self.pixel_size;

        let mut d = math::normalize(self.dir * self.focal_length + self.right * x + self.screen_up * y);
        if math::is_zero(&d) {
            d = self.dir;
        }
        Ray::new(self.pos, d)
    }
}
