#![allow(clippy::float_cmp)]

extern crate cgmath;
extern crate clap;
extern crate log4rs;
extern crate num_cpus;
#[macro_use]
extern crate log;
extern crate pathmutation;

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use pathmutation::accel::NaiveAcceleration;
use pathmutation::integrators::mutation::{IntegratorMutation, MutationStrategy, RenderParams};
use pathmutation::integrators::Integrator;
use pathmutation::scene_loader::{OBJSceneLoader, SceneLoader};
use std::error::Error;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Scene description file (OBJ)
    #[arg(value_name = "FILE")]
    scene: String,
    /// Output image file (ppm, pfm or png)
    #[arg(long, short, value_name = "FILE", default_value = "out.ppm")]
    output: String,
    /// Image width
    #[arg(long, default_value_t = 320)]
    width: u32,
    /// Image height
    #[arg(long, default_value_t = 240)]
    height: u32,
    /// Image scale (to faster or slower rendering)
    #[arg(long, default_value_t = 1_f32)]
    scale_image: f32,
    /// Number of mutations per pixel
    #[arg(long, short, default_value_t = 64)]
    k_mutations: usize,
    /// Maximum number of bounces
    #[arg(long, short, default_value_t = 8)]
    max_bounces: usize,
    /// Number of directions tried per bounce
    #[arg(long, short, default_value_t = 12)]
    retries: usize,
    /// Mutation radius (fraction of the scene diagonal)
    #[arg(long, default_value_t = 0.05)]
    radius: f32,
    /// Mutation strategy: retrace, meshwalk, project, resample or all
    #[arg(long, short, default_value = "all")]
    strategy: String,
    /// Random seed
    #[arg(long, default_value_t = 1337)]
    seed: u64,
    /// Number of threads
    #[arg(long, short, allow_hyphen_values(true))]
    threads: Option<i32>,
    /// Logs
    #[arg(long, short)]
    log: Option<String>,
}

/// Insert the strategy name before the file extension
fn output_name(output: &str, strategy: MutationStrategy) -> String {
    let path = std::path::Path::new(output);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path
            .with_file_name(format!(
                "{}_{}.{}",
                stem.to_string_lossy(),
                strategy,
                ext.to_string_lossy()
            ))
            .to_string_lossy()
            .into_owned(),
        _ => format!("{}_{}.ppm", output, strategy),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let _handle = {
        let level = log::LevelFilter::Info;
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new("{l} {M} - {m}\n")))
            .build();
        let config = if let Some(log) = &cli.log {
            let logfile = FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{l} {M} - {m}\n")))
                .build(log)?;

            Config::builder()
                .appender(Appender::builder().build("logfile", Box::new(logfile)))
                .appender(
                    Appender::builder()
                        .filter(Box::new(ThresholdFilter::new(level)))
                        .build("stderr", Box::new(stderr)),
                )
                .build(
                    Root::builder()
                        .appender("logfile")
                        .appender("stderr")
                        .build(LevelFilter::Trace),
                )?
        } else {
            Config::builder()
                .appender(
                    Appender::builder()
                        .filter(Box::new(ThresholdFilter::new(level)))
                        .build("stderr", Box::new(stderr)),
                )
                .build(Root::builder().appender("stderr").build(level))?
        };

        log4rs::init_config(config)?
    };

    let strategies = match cli.strategy.as_str() {
        "all" => MutationStrategy::ALL.to_vec(),
        s => vec![s.parse::<MutationStrategy>()?],
    };

    let loader = OBJSceneLoader {
        img_size: cgmath::Vector2::new(cli.width, cli.height),
    };
    let scene = loader.load(&cli.scene)?;
    let scene = match cli.threads {
        None => scene,
        Some(v) => match v {
            v if v > 0 => scene.nb_threads(v as usize),
            v if v < 0 => {
                let nb_threads = num_cpus::get() as i32 + v;
                if nb_threads <= 0 {
                    return Err(format!(
                        "Not enough threads: {} removing {}",
                        num_cpus::get(),
                        v
                    )
                    .into());
                }
                info!("Run with {} threads", nb_threads);
                scene.nb_threads(nb_threads as usize)
            }
            _ => return Err("Impossible to use 0 thread for the computation".into()),
        },
    };
    let mut scene = scene.output_img(&cli.output);
    if cli.scale_image != 1.0 {
        if cli.scale_image <= 0.0 {
            return Err(format!("Invalid image scale: {}", cli.scale_image).into());
        }
        info!("Scale the image: {:?}", cli.scale_image);
        scene.camera.scale_image(cli.scale_image);
    }
    let accel = NaiveAcceleration::new(&scene.mesh);

    let params = RenderParams::default()
        .k_mutations(cli.k_mutations)
        .max_bounces(cli.max_bounces)
        .retries_per_bounce(cli.retries)
        .mutate_radius_frac(cli.radius);

    let single = strategies.len() == 1;
    for (i, strategy) in strategies.into_iter().enumerate() {
        let seed = cli.seed + 100 * i as u64;
        let mut int = IntegratorMutation::new(params.clone(), strategy, seed);
        let img = int.compute(&accel, &scene)?;

        let output = if single {
            scene.output_img_path.clone()
        } else {
            output_name(&scene.output_img_path, strategy)
        };
        info!("Save final image: {}", output);
        pathmutation::tools::save(&output, &img)?;
    }
    Ok(())
}
