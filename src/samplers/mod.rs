use cgmath::Point2;

pub trait Sampler: Send {
    fn next(&mut self) -> f32;
    fn next2d(&mut self) -> Point2<f32>;
}

pub mod independent;
