//! Command-line front end. Scene file parsing is out of scope, so this
//! renders one of a small set of built-in demo scenes instead.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::error;
use pathtracer::math::{Point, Vec3};
use pathtracer::primitive::{Bilinear, Primitive, Sphere};
use pathtracer::scene::{PinholeCamera, PointLight, Scene, SceneBuilder, SphereLight};
use pathtracer::{Config, Renderer};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    /// A handful of spheres lit by a point light.
    Spheres,
    /// A single large bilinear patch, forcing several refine/dice cycles.
    Patch,
}

/// Bucketed Monte Carlo path tracer with lazy-diced Reyes primitives.
#[derive(Parser, Debug)]
#[command(name = "pathtracer", about, version)]
struct Args {
    /// Which built-in demo scene to render.
    #[arg(long, value_enum, default_value_t = Demo::Spheres)]
    demo: Demo,

    /// Output image width in pixels.
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Output image height in pixels.
    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Samples per pixel.
    #[arg(long, default_value_t = 16)]
    spp: u32,

    /// RNG seed.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Worker thread count.
    #[arg(long, default_value_t = num_cpus())]
    threads: usize,

    /// Output PNG path.
    #[arg(long, default_value = "render.png")]
    output: PathBuf,

    /// Skip film accumulation and file output; useful for benchmarking.
    #[arg(long)]
    no_output: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn build_scene(demo: Demo) -> Scene {
    let camera = PinholeCamera::new(
        Point::new(0.0, -6.0, 1.5),
        Point::new(0.0, 0.0, 0.5),
        Vec3::new(0.0, 0.0, 1.0),
        1.0,
    );

    match demo {
        Demo::Spheres => SceneBuilder::new()
            .camera(camera)
            .light(PointLight::new(
                Point::new(3.0, -3.0, 4.0),
                pathtracer::color::Rgb::splat(40.0),
            ))
            .light(SphereLight::new(
                Point::new(-4.0, -2.0, 3.0),
                0.5,
                pathtracer::color::Rgb::new(30.0, 20.0, 10.0),
            ))
            .primitive(Primitive::Sphere(Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0)))
            .primitive(Primitive::Sphere(Sphere::new(Point::new(1.8, 1.0, -0.3), 0.7)))
            .primitive(Primitive::Sphere(Sphere::new(Point::new(-1.6, 1.2, -0.5), 0.5)))
            .build(),

        Demo::Patch => SceneBuilder::new()
            .camera(camera)
            .light(PointLight::new(
                Point::new(0.0, -4.0, 5.0),
                pathtracer::color::Rgb::splat(50.0),
            ))
            .primitive(Primitive::Bilinear(Bilinear::new(
                Point::new(-4.0, 0.0, -1.0),
                Point::new(4.0, 0.0, -1.0),
                Point::new(4.0, 4.0, 1.0),
                Point::new(-4.0, 4.0, 1.0),
            )))
            .build(),
    }
}

fn run(args: Args) -> pathtracer::Result<()> {
    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .ok();

    let scene = build_scene(args.demo);
    let mut config = Config::default();
    config.no_output = args.no_output;

    let renderer = Renderer::new(
        scene,
        config,
        args.width,
        args.height,
        args.spp,
        args.seed,
        args.output,
    )?;
    renderer.render(args.threads)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
