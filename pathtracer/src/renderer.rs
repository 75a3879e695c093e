//! The renderer shell: owns everything that is not part of the scene
//! description itself (resolution, sample count, seed, thread count, output
//! destination) and drives a render from start to finish.

use std::path::PathBuf;
use std::sync::Mutex;

use log::info;

use crate::cache::GridCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::film::Film;
use crate::integrator::{PathTraceIntegrator, RenderProgress};
use crate::scene::Scene;
use crate::stats::Stats;

pub struct Renderer {
    scene: Scene,
    config: Config,
    res_x: u32,
    res_y: u32,
    spp: u32,
    seed: u64,
    output_path: PathBuf,
}

impl Renderer {
    pub fn new(
        scene: Scene,
        config: Config,
        res_x: u32,
        res_y: u32,
        spp: u32,
        seed: u64,
        output_path: PathBuf,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scene,
            config,
            res_x,
            res_y,
            spp,
            seed,
            output_path,
        })
    }

    pub fn set_resolution(&mut self, res_x: u32, res_y: u32) {
        self.res_x = res_x;
        self.res_y = res_y;
    }

    pub fn set_spp(&mut self, spp: u32) {
        self.spp = spp;
    }

    /// Runs the render with `thread_count` worker threads, writing the
    /// result to `output_path` unless the configuration disables output.
    /// Returns the final render's diagnostic counters.
    pub fn render(&self, thread_count: usize) -> Result<Stats> {
        let progress = RenderProgress::new();
        self.render_with_progress(thread_count, &progress)
    }

    /// As [`Renderer::render`], but reports each completed bucket to
    /// `progress` from inside the film's accumulation lock, so a caller on
    /// another thread can poll [`RenderProgress::blocks_done`] for a
    /// cooperative progress readout.
    pub fn render_with_progress(&self, thread_count: usize, progress: &RenderProgress) -> Result<Stats> {
        info!(
            "rendering {}x{} at {} spp, seed {}, {} thread(s)",
            self.res_x, self.res_y, self.spp, self.seed, thread_count
        );

        let cache = GridCache::new(self.config.grid_cache_capacity);
        let stats = Stats::new();
        let film = Mutex::new(Film::new(self.res_x, self.res_y));

        let integrator =
            PathTraceIntegrator::new(&self.scene, &self.config, &cache, &stats, self.spp, self.seed)
                .with_progress(progress);
        integrator.integrate(&film, thread_count);

        info!(
            "done: {} primitive ray tests, {} splits, {} micropolygons generated",
            stats.primitive_ray_tests(),
            stats.split_count(),
            stats.upoly_gen_count()
        );

        if !self.config.no_output {
            let film = film.into_inner().unwrap();
            film.write_png(&self.output_path)?;
            info!("wrote {}", self.output_path.display());
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point, Vec3};
    use crate::primitive::{Primitive, Sphere};
    use crate::scene::{PinholeCamera, SceneBuilder};

    fn tmp_output(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pathtracer-test-{name}.png"))
    }

    #[test]
    fn no_output_render_skips_writing_a_file() {
        let scene = SceneBuilder::new()
            .camera(PinholeCamera::new(
                Point::new(0.0, 0.0, -5.0),
                Point::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                1.0,
            ))
            .primitive(Primitive::Sphere(Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0)))
            .build();

        let mut config = Config::default();
        config.no_output = true;
        let path = tmp_output("no-output");
        let _ = std::fs::remove_file(&path);

        let renderer = Renderer::new(scene, config, 4, 4, 1, 1, path.clone()).unwrap();
        let stats = renderer.render(1).unwrap();

        assert!(!path.exists());
        assert!(stats.primitive_ray_tests() > 0);
    }

    #[test]
    fn progress_counts_one_bucket_per_accumulated_flush() {
        let scene = SceneBuilder::new()
            .camera(PinholeCamera::new(
                Point::new(0.0, 0.0, -5.0),
                Point::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                1.0,
            ))
            .primitive(Primitive::Sphere(Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0)))
            .build();

        let config = Config::default();
        let path = tmp_output("progress");
        let _ = std::fs::remove_file(&path);

        let renderer = Renderer::new(scene, config, 4, 4, 1, 1, path.clone()).unwrap();
        let progress = RenderProgress::new();
        renderer.render_with_progress(1, &progress).unwrap();

        assert!(progress.blocks_done() > 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let scene = SceneBuilder::new()
            .camera(PinholeCamera::new(
                Point::new(0.0, 0.0, -5.0),
                Point::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                1.0,
            ))
            .build();
        let mut config = Config::default();
        config.samples_per_bucket = 0;

        let result = Renderer::new(scene, config, 4, 4, 1, 1, tmp_output("invalid"));
        assert!(matches!(result, Err(Error::BadConfig { .. })));
    }
}
