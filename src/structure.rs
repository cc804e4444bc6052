use crate::constants;
use cgmath::*;
use std;
use std::ops::*;

/// Pixel color representation
#[derive(Clone, PartialEq, Debug, Copy)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b }
    }
    pub fn zero() -> Color {
        Color::new(0.0, 0.0, 0.0)
    }
    pub fn one() -> Color {
        Color::new(1.0, 1.0, 1.0)
    }
    pub fn value(v: f32) -> Color {
        Color::new(v, v, v)
    }

    pub fn is_zero(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::zero()
    }
}

/////////////// Operators
impl MulAssign<Color> for Color {
    fn mul_assign(&mut self, other: Color) {
        self.r *= other.r;
        self.g *= other.g;
        self.b *= other.b;
    }
}

impl AddAssign<Color> for Color {
    fn add_assign(&mut self, other: Color) {
        self.r += other.r;
        self.g += other.g;
        self.b += other.b;
    }
}

impl Div<f32> for Color {
    type Output = Self;
    fn div(self, other: f32) -> Color {
        assert!(other.is_finite());
        assert_ne!(other, 0.0);
        Color {
            r: self.r / other,
            g: self.g / other,
            b: self.b / other,
        }
    }
}

impl Mul<f32> for Color {
    type Output = Self;
    fn mul(self, other: f32) -> Color {
        if other.is_finite() {
            Color {
                r: self.r * other,
                g: self.g * other,
                b: self.b * other,
            }
        } else {
            Color::zero()
        }
    }
}

impl Mul<Color> for Color {
    type Output = Self;
    fn mul(self, other: Color) -> Color {
        Color {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
        }
    }
}

/// Ray representation
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub o: Point3<f32>,
    pub d: Vector3<f32>,
    pub tnear: f32,
    pub tfar: f32,
}

impl Ray {
    pub fn new(o: Point3<f32>, d: Vector3<f32>) -> Ray {
        Ray {
            o,
            d,
            tnear: constants::EPSILON,
            tfar: std::f32::MAX,
        }
    }
}

/// Closest hit returned by the acceleration structure
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    /// Intersection distance
    pub dist: f32,
    /// Intersection point
    pub p: Point3<f32>,
    /// Shading normal (normalized)
    pub n_s: Vector3<f32>,
    /// Barycentric coordinates (w, u, v)
    pub bary: Vector3<f32>,
    /// Triangle which we have intersected
    pub tri_id: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct AABB {
    pub p_min: Vector3<f32>,
    pub p_max: Vector3<f32>,
}

impl Default for AABB {
    fn default() -> Self {
        Self {
            p_min: Vector3::new(std::f32::MAX, std::f32::MAX, std::f32::MAX),
            p_max: Vector3::new(std::f32::MIN, std::f32::MIN, std::f32::MIN),
        }
    }
}

impl AABB {
    pub fn is_valid(&self) -> bool {
        self.p_max.x >= self.p_min.x && self.p_max.y >= self.p_min.y && self.p_max.z >= self.p_min.z
    }

    pub fn union_vec(&self, v: &Vector3<f32>) -> AABB {
        AABB {
            p_min: Vector3::new(
                self.p_min.x.min(v.x),
                self.p_min.y.min(v.y),
                self.p_min.z.min(v.z),
            ),
            p_max: Vector3::new(
                self.p_max.x.max(v.x),
                self.p_max.y.max(v.y),
                self.p_max.z.max(v.z),
            ),
        }
    }

    pub fn size(&self) -> Vector3<f32> {
        self.p_max - self.p_min
    }

    pub fn center(&self) -> Vector3<f32> {
        self.size() * 0.5 + self.p_min
    }

    /// Length of the box diagonal (0 for an empty box)
    pub fn diagonal(&self) -> f32 {
        if self.is_valid() {
            self.size().magnitude()
        } else {
            0.0
        }
    }
}

/// Image buffer (row-major)
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub size: Vector2<u32>,
    pub colors: Vec<Color>,
}

impl Bitmap {
    pub fn new(size: Vector2<u32>) -> Bitmap {
        Bitmap {
            size,
            colors: vec![Color::default(); (size.x * size.y) as usize],
        }
    }

    fn index(&self, p: Point2<u32>) -> usize {
        assert!(p.x < self.size.x);
        assert!(p.y < self.size.y);
        (p.y * self.size.x + p.x) as usize
    }

    pub fn accumulate(&mut self, p: Point2<u32>, f: Color) {
        let i = self.index(p);
        self.colors[i] += f;
    }

    /// Copy the other bitmap at a given offset
    pub fn accumulate_bitmap(&mut self, o: &Bitmap, pos: Point2<u32>) {
        for y in 0..o.size.y {
            for x in 0..o.size.x {
                let p = Point2::new(pos.x + x, pos.y + y);
                self.accumulate(p, o.pixel(Point2::new(x, y)));
            }
        }
    }

    pub fn pixel(&self, p: Point2<u32>) -> Color {
        self.colors[self.index(p)]
    }

    pub fn average(&self) -> Color {
        let mut s = Color::zero();
        self.colors.iter().for_each(|x| s += *x);
        s / self.colors.len() as f32
    }

}
