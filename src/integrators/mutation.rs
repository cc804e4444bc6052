use crate::accel::Acceleration;
use crate::integrators::radiance::compute_radiance;
use crate::integrators::*;
use crate::paths::mutator::PathMutator;
use crate::samplers::Sampler;
use crate::scene::Scene;
use crate::structure::{Bitmap, Color};
use std::fmt;
use std::str::FromStr;

/// Rendering configuration
#[derive(Clone, Debug)]
pub struct RenderParams {
    /// Maximum number of surface vertices of a sampled path
    pub max_bounces: usize,
    /// Number of directions tried before stopping a path
    pub retries_per_bounce: usize,
    /// Number of mutations per pixel
    pub k_mutations: usize,
    pub visibility_eps: f32,
    /// Mutation radius relative to the scene diagonal
    pub mutate_radius_frac: f32,
    pub albedo: Color,
    pub light_intensity: Color,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            max_bounces: 8,
            retries_per_bounce: 12,
            k_mutations: 64,
            visibility_eps: 1e-4,
            mutate_radius_frac: 0.05,
            albedo: Color::value(0.7),
            light_intensity: Color::value(20.0),
        }
    }
}

impl RenderParams {
    pub fn max_bounces(mut self, n: usize) -> Self {
        self.max_bounces = n;
        self
    }
    pub fn retries_per_bounce(mut self, n: usize) -> Self {
        self.retries_per_bounce = n;
        self
    }
    pub fn k_mutations(mut self, k: usize) -> Self {
        self.k_mutations = k;
        self
    }
    pub fn mutate_radius_frac(mut self, f: f32) -> Self {
        self.mutate_radius_frac = f;
        self
    }
    pub fn visibility_eps(mut self, eps: f32) -> Self {
        self.visibility_eps = eps;
        self
    }
}

/// Operator used to propose a new path from the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStrategy {
    /// New direction from the same vertex
    Retrace,
    /// Geodesic walk over the mesh
    MeshWalk,
    /// Ray cast from above the tangent plane
    Project,
    /// Completely new path through the same pixel
    Resample,
}

impl MutationStrategy {
    pub const ALL: [MutationStrategy; 4] = [
        MutationStrategy::Retrace,
        MutationStrategy::MeshWalk,
        MutationStrategy::Project,
        MutationStrategy::Resample,
    ];
}

impl fmt::Display for MutationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationStrategy::Retrace => "retrace",
            MutationStrategy::MeshWalk => "meshwalk",
            MutationStrategy::Project => "project",
            MutationStrategy::Resample => "resample",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MutationStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retrace" => Ok(MutationStrategy::Retrace),
            "meshwalk" => Ok(MutationStrategy::MeshWalk),
            "project" => Ok(MutationStrategy::Project),
            "resample" => Ok(MutationStrategy::Resample),
            _ => Err(format!("Unknown mutation strategy: {}", s)),
        }
    }
}

/// Proposal counters
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct MutationStats {
    pub nb_proposed: usize,
    pub nb_accepted: usize,
    /// Pixels where no path could be sampled
    pub nb_black: usize,
}

impl std::ops::AddAssign for MutationStats {
    fn add_assign(&mut self, other: Self) {
        self.nb_proposed += other.nb_proposed;
        self.nb_accepted += other.nb_accepted;
        self.nb_black += other.nb_black;
    }
}

impl MutationStats {
    pub fn acceptance_rate(&self) -> f32 {
        if self.nb_proposed == 0 {
            0.0
        } else {
            self.nb_accepted as f32 / self.nb_proposed as f32
        }
    }
}

/// For each pixel, sample a path then mutate it `k_mutations` times.
/// Every valid proposal becomes the current path and the pixel value
/// is the average radiance of all the visited paths.
/// No Metropolis-Hastings acceptance is done.
pub struct IntegratorMutation {
    pub params: RenderParams,
    pub strategy: MutationStrategy,
    /// Base seed of the per-pixel random number generators
    pub seed: u64,
    pub stats: MutationStats,
}

impl IntegratorMutation {
    pub fn new(params: RenderParams, strategy: MutationStrategy, seed: u64) -> Self {
        IntegratorMutation {
            params,
            strategy,
            seed,
            stats: MutationStats::default(),
        }
    }

    pub fn radius(&self, scene: &Scene) -> f32 {
        (self.params.mutate_radius_frac * scene.diagonal()).max(1e-6)
    }
}

impl Integrator for IntegratorMutation {
    fn compute(
        &mut self,
        accel: &dyn Acceleration,
        scene: &Scene,
    ) -> Result<Bitmap, Box<dyn Error>> {
        info!("Render with {} mutations", self.strategy);
        info!(" - params: {:?}", self.params);
        info!(" - radius: {}", self.radius(scene));
        info!(" - seed: {}", self.seed);
        let (img, stats) = compute_mc(&*self, accel, scene, self.seed)?;
        info!(
            "Proposals: {} | accepted: {} ({:.2}%) | black pixels: {}",
            stats.nb_proposed,
            stats.nb_accepted,
            stats.acceptance_rate() * 100.0,
            stats.nb_black
        );
        self.stats = stats;
        Ok(img)
    }
}

impl IntegratorMC for IntegratorMutation {
    type Stats = MutationStats;

    fn compute_pixel(
        &self,
        (ix, iy): (u32, u32),
        accel: &dyn Acceleration,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        stats: &mut MutationStats,
    ) -> Color {
        let mutator = PathMutator::new(scene, accel).visibility_eps(self.params.visibility_eps);
        let d = scene.camera.generate((ix, iy)).d;
        let (max_bounces, retries) = (self.params.max_bounces, self.params.retries_per_bounce);

        let mut current = match mutator.sample_path(max_bounces, d, retries, sampler) {
            Some(p) => p,
            None => {
                stats.nb_black += 1;
                return Color::zero();
            }
        };
        let radius = self.radius(scene);
        let mut sum = compute_radiance(&current, scene, accel, &self.params);
        let mut nb_paths = 1;
        for _ in 0..self.params.k_mutations {
            // The first surface vertex is never mutated
            let (lo, hi) = (2, current.len().saturating_sub(2));
            if hi < lo {
                break;
            }
            let index = (lo + (sampler.next() * (hi - lo + 1) as f32) as usize).min(hi);

            stats.nb_proposed += 1;
            let mut proposal = current.clone();
            let res = match self.strategy {
                MutationStrategy::Retrace => {
                    mutator.mutate_vertex_retrace(&mut proposal, index, sampler)
                }
                MutationStrategy::MeshWalk => {
                    mutator.mutate_vertex_meshwalk(&mut proposal, index, radius, sampler)
                }
                MutationStrategy::Project => {
                    mutator.mutate_vertex_project(&mut proposal, index, radius, sampler)
                }
                MutationStrategy::Resample => {
                    match mutator.sample_path(max_bounces, d, retries, sampler) {
                        Some(p) => {
                            proposal = p;
                            Ok(())
                        }
                        None => continue,
                    }
                }
            };
            if let Err(e) = res {
                trace!("Proposal rejected ({}, {}): {}", ix, iy, e);
                continue;
            }

            stats.nb_accepted += 1;
            current = proposal;
            sum += compute_radiance(&current, scene, accel, &self.params);
            nb_paths += 1;
        }
        sum / nb_paths as f32
    }
}
