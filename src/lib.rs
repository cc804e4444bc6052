#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]

// For the vector op
extern crate cgmath;
// For easy parallelism
extern crate rayon;
// For the image (LDR) export
#[cfg(feature = "image")]
extern crate image;
// For the random number generator
extern crate rand;
// For loading the obj files
extern crate tobj;
// For logging
#[macro_use]
extern crate log;
// For sanity checks
#[macro_use]
extern crate assert_approx_eq;

pub mod constants {
    /// Ray epsilon, also used to offset ray origins from the surface
    pub const EPSILON: f32 = 0.0001;
}

// all the modules
pub mod accel;
pub mod camera;
pub mod geometry;
pub mod integrators;
pub mod math;
pub mod paths;
pub mod samplers;
pub mod scene;
pub mod scene_loader;
pub mod structure;
pub mod tools;
