use crate::accel::Acceleration;
use crate::samplers::independent::IndependentSampler;
use crate::samplers::Sampler;
use crate::scene::Scene;
use crate::structure::{Bitmap, Color};
use cgmath::{Point2, Vector2};
#[cfg(feature = "progress-bar")]
use pbr::ProgressBar;
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use std::cmp;
use std::error::Error;
use std::ops::AddAssign;
use std::sync::Mutex;
use std::time::Instant;

//////////////// Helpers
/// Image block
/// for easy paralelisation over the thread
pub struct ImageBlock {
    pub pos: Point2<u32>,
    pub img: Bitmap,
}

impl ImageBlock {
    pub fn new(pos: Point2<u32>, size: Vector2<u32>) -> ImageBlock {
        ImageBlock {
            pos,
            img: Bitmap::new(size),
        }
    }

    pub fn size(&self) -> Vector2<u32> {
        self.img.size
    }
}

pub const BLOCK_SIZE: u32 = 16;

/// Cut the image into blocks of at most `BLOCK_SIZE` x `BLOCK_SIZE` pixels
pub fn generate_img_blocks(size: Vector2<u32>) -> Vec<ImageBlock> {
    let mut image_blocks = vec![];
    for ix in (0..size.x).step_by(BLOCK_SIZE as usize) {
        for iy in (0..size.y).step_by(BLOCK_SIZE as usize) {
            image_blocks.push(ImageBlock::new(
                Point2::new(ix, iy),
                Vector2::new(
                    cmp::min(BLOCK_SIZE, size.x - ix),
                    cmp::min(BLOCK_SIZE, size.y - iy),
                ),
            ));
        }
    }
    image_blocks
}

pub fn generate_pool(scene: &Scene) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    match scene.nb_threads {
        None => rayon::ThreadPoolBuilder::new(),
        Some(x) => rayon::ThreadPoolBuilder::new().num_threads(x),
    }
    .build()
}

/////////////// Integrators code
pub trait Integrator {
    fn compute(
        &mut self,
        accel: &dyn Acceleration,
        scene: &Scene,
    ) -> Result<Bitmap, Box<dyn Error>>;
}

/// Integrator that computes each pixel independently
pub trait IntegratorMC: Sync + Send {
    /// Counters gathered over a block, merged at the end of the rendering
    type Stats: Default + Send + AddAssign;

    fn compute_pixel(
        &self,
        pix: (u32, u32),
        accel: &dyn Acceleration,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        stats: &mut Self::Stats,
    ) -> Color;
}

/// Render all the pixels in parallel.
/// Each pixel owns a sampler derived from `seed` and its position,
/// so the image does not depend on the number of threads.
pub fn compute_mc<T: IntegratorMC>(
    int: &T,
    accel: &dyn Acceleration,
    scene: &Scene,
    seed: u64,
) -> Result<(Bitmap, T::Stats), Box<dyn Error>> {
    let size = *scene.camera.size();
    let mut image_blocks = generate_img_blocks(size);
    info!("Number of blocks: {}", image_blocks.len());

    let stats = Mutex::new(T::Stats::default());
    #[cfg(feature = "progress-bar")]
    let progress_bar = Mutex::new(ProgressBar::new(image_blocks.len() as u64));
    let pool = generate_pool(scene)?;
    let start = Instant::now();
    pool.install(|| {
        image_blocks.par_iter_mut().for_each(|im_block| {
            let mut block_stats = T::Stats::default();
            for iy in 0..im_block.size().y {
                for ix in 0..im_block.size().x {
                    let pix = (ix + im_block.pos.x, iy + im_block.pos.y);
                    let mut sampler = IndependentSampler::from_pixel(seed, pix);
                    let c = int.compute_pixel(pix, accel, scene, &mut sampler, &mut block_stats);
                    im_block.img.accumulate(Point2::new(ix, iy), c);
                }
            }

            if let Ok(mut s) = stats.lock() {
                *s += block_stats;
            }
            #[cfg(feature = "progress-bar")]
            {
                if let Ok(mut pb) = progress_bar.lock() {
                    pb.inc();
                }
            }
        });
    });
    let elapsed = start.elapsed();
    info!("Elapsed rendering: {} ms", elapsed.as_millis());

    // Fill the image
    let mut image = Bitmap::new(size);
    for im_block in &image_blocks {
        image.accumulate_bitmap(&im_block.img, im_block.pos);
    }
    let stats = stats
        .into_inner()
        .map_err(|_| "a rendering thread panicked")?;
    Ok((image, stats))
}

pub mod mutation;
pub mod radiance;
