use crate::samplers::*;
use cgmath::Point2;
use rand::prelude::*;

pub struct IndependentSampler {
    rnd: rand::rngs::SmallRng,
}

impl Sampler for IndependentSampler {
    fn next(&mut self) -> f32 {
        self.rnd.gen()
    }
    fn next2d(&mut self) -> Point2<f32> {
        let x = self.rnd.gen();
        let y = self.rnd.gen();
        Point2::new(x, y)
    }
}

impl IndependentSampler {
    pub fn from_seed(seed: u64) -> Self {
        IndependentSampler {
            rnd: rand::rngs::SmallRng::seed_from_u64(seed),
        }
    }

    /// Sampler owned by a single pixel. The stream only depends
    /// on the base seed and the pixel position, so the rendering
    /// does not depend on the thread scheduling.
    pub fn from_pixel(seed: u64, (ix, iy): (u32, u32)) -> Self {
        let pixel = ((iy as u64) << 32) | ix as u64;
        // SplitMix64 finalizer to decorrelate neighbouring pixels
        let mut z = seed ^ pixel.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        IndependentSampler::from_seed(z ^ (z >> 31))
    }
}
