//! The path-tracing integrator: solves the rendering equation over a
//! scene's buckets using wavefront (batched) path tracing with next-event
//! estimation.
//!
//! Each worker thread pulls pixel blocks off a shared [`BucketQueue`],
//! generates every sample's full path in lockstep across the block (camera
//! ray -> intersect -> bounce ray -> intersect -> shadow ray -> intersect,
//! repeated `path_length` times), and flushes the finished block into the
//! shared [`Film`] under a mutex.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use cgmath::InnerSpace as _;
use itertools::iproduct;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::cache::GridCache;
use crate::color::Rgb;
use crate::config::Config;
use crate::film::Film;
use crate::math::{cosine_sample_hemisphere, zup_to_vec, FreeCoordinate, Vec3};
use crate::morton;
use crate::queue::{BucketQueue, PixelBlock};
use crate::ray::{Intersection, Ray};
use crate::scene::Scene;
use crate::stats::Stats;

/// Total path segments per sample, counting the initial camera ray as
/// segment zero. Matches the original renderer's hardcoded default.
const PATH_LENGTH: usize = 3;

/// Per-sample-dimension stride: 2 pixel-footprint dims, 2 lens dims, 1 time
/// dim, per bounce segment, reserved up front so every segment draws from
/// a disjoint slice of the sample vector.
const DIMS_PER_SEGMENT: usize = 5;

fn lambert(a: Vec3, b: Vec3) -> FreeCoordinate {
    let a = a.normalize();
    let b = b.normalize();
    a.dot(b).max(0.0)
}

/// Per-path state carried across bounce segments.
#[derive(Clone)]
struct PathState {
    inter: Intersection,
    col: Rgb,
    fcol: Rgb,
    lcol: Rgb,
    done: bool,
}

impl Default for PathState {
    fn default() -> Self {
        Self {
            inter: Intersection::default(),
            col: Rgb::ZERO,
            fcol: Rgb::ONE,
            lcol: Rgb::ZERO,
            done: false,
        }
    }
}

pub struct PathTraceIntegrator<'a> {
    scene: &'a Scene,
    config: &'a Config,
    cache: &'a GridCache,
    stats: &'a Stats,
    spp: u32,
    seed: u64,
    progress: Option<&'a RenderProgress>,
}

impl<'a> PathTraceIntegrator<'a> {
    pub fn new(
        scene: &'a Scene,
        config: &'a Config,
        cache: &'a GridCache,
        stats: &'a Stats,
        spp: u32,
        seed: u64,
    ) -> Self {
        Self {
            scene,
            config,
            cache,
            stats,
            spp,
            seed,
            progress: None,
        }
    }

    /// Reports one bucket completed, from inside the film lock, to `progress`
    /// for every subsequent render. Optional: a caller that doesn't care
    /// about progress (e.g. a one-off test render) never needs to set this.
    pub fn with_progress(mut self, progress: &'a RenderProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Renders the whole image into `film` using `thread_count` worker
    /// threads, blocking until every bucket has been traced.
    pub fn integrate(&self, film: &Mutex<Film>, thread_count: usize) {
        let thread_count = thread_count.max(1);
        let (width, height) = {
            let f = film.lock().unwrap();
            (f.width(), f.height())
        };

        let bucket_size = self.bucket_size(width, height, thread_count);
        let queue: Arc<BucketQueue<PixelBlock>> = Arc::new(BucketQueue::new(thread_count * 2));

        thread::scope(|scope| {
            for worker in 0..thread_count {
                let queue = Arc::clone(&queue);
                let worker_seed = self.seed ^ ((worker as u64) << 32);
                scope.spawn(move || {
                    self.render_blocks(&queue, film, worker_seed);
                });
            }

            self.populate_blocks(&queue, width, height, bucket_size);
        });
    }

    /// Roughly four buckets per thread, sized so each bucket holds about
    /// `samples_per_bucket` total samples at this `spp`.
    fn bucket_size(&self, width: u32, height: u32, thread_count: usize) -> u32 {
        let min_bucket = 1u32;
        let max_bucket =
            (((width as f64) * (height as f64)) / (thread_count as f64 * 4.0)).sqrt() as u32;
        let target = ((self.config.samples_per_bucket as f64) / (self.spp.max(1) as f64))
            .sqrt() as u32;
        target.min(max_bucket.max(min_bucket)).max(min_bucket)
    }

    /// Producer loop: walks a Morton sweep over the bucket grid, pushing
    /// every in-bounds block, then closes the queue.
    fn populate_blocks(&self, queue: &BucketQueue<PixelBlock>, width: u32, height: u32, bucket_size: u32) {
        let morton_stop = (width.max(height) as u64) * 2;
        let greater_width = width > height;
        let mut i: u32 = 0;

        loop {
            let (bx, by) = if greater_width {
                let (a, b) = morton::d2xy(i);
                (b, a)
            } else {
                morton::d2xy(i)
            };
            let xp = bx * bucket_size;
            let yp = by * bucket_size;

            if xp < width && yp < height {
                let w = (width - xp).min(bucket_size);
                let h = (height - yp).min(bucket_size);
                queue.push_blocking(PixelBlock { x: xp, y: yp, w, h });
            }

            if xp as u64 >= morton_stop && yp as u64 >= morton_stop {
                break;
            }
            i += 1;
        }

        queue.close();
    }

    /// Consumer loop run by every worker thread: pops blocks until the
    /// queue is closed and drained, fully path-tracing each one.
    fn render_blocks(&self, queue: &BucketQueue<PixelBlock>, film: &Mutex<Film>, seed: u64) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

        while let Some(block) = queue.pop_blocking() {
            self.render_block(block, film, &mut rng);
        }
    }

    fn render_block(&self, block: PixelBlock, film: &Mutex<Film>, rng: &mut Xoshiro256PlusPlus) {
        let (img_w, img_h) = {
            let f = film.lock().unwrap();
            (f.width(), f.height())
        };
        let sample_count = (block.w as usize) * (block.h as usize) * (self.spp as usize);
        let samp_dim = (PATH_LENGTH + 1) * DIMS_PER_SEGMENT;

        let mut samps = vec![0.0f64; sample_count * samp_dim];
        let mut coords = vec![(0u32, 0u32); sample_count];
        let mut paths: Vec<PathState> = vec![PathState::default(); sample_count];

        // `samps[i*samp_dim]`/`[i*samp_dim+1]` are the jittered pixel
        // position in normalized `[0, 1)` image-space, already folding in
        // which pixel this sample belongs to; every later dimension is a
        // plain canonical random used by a specific bounce segment.
        let mut samp_i = 0;
        for (x, y) in iproduct!(block.x..block.x + block.w, block.y..block.y + block.h) {
            for _ in 0..self.spp {
                let jitter_x: f64 = rng.gen();
                let jitter_y: f64 = rng.gen();
                samps[samp_i * samp_dim] = (x as f64 + jitter_x) / img_w as f64;
                samps[samp_i * samp_dim + 1] = (y as f64 + jitter_y) / img_h as f64;
                for d in 2..samp_dim {
                    samps[samp_i * samp_dim + d] = rng.gen::<f64>();
                }
                coords[samp_i] = (x, y);
                samp_i += 1;
            }
        }

        // World-space extent of the image plane is fixed at `2.0` along
        // each axis; `dx`/`dy` are one pixel's footprint within that.
        let world_width = 2.0;
        let world_height = 2.0 * img_h as FreeCoordinate / img_w as FreeCoordinate;
        let dx = world_width / img_w as FreeCoordinate;
        let dy = world_height / img_h as FreeCoordinate;

        let mut ids: Vec<usize> = (0..sample_count).collect();
        let mut rays: Vec<Ray> = Vec::with_capacity(sample_count);
        let mut intersections: Vec<Intersection> = Vec::with_capacity(sample_count);

        for bounce in 0..PATH_LENGTH {
            let so = bounce * DIMS_PER_SEGMENT;

            rays.clear();
            ids.clear();

            if bounce == 0 {
                for i in 0..sample_count {
                    let rx = (samps[i * samp_dim] - 0.5) * world_width;
                    let ry = (0.5 - samps[i * samp_dim + 1]) * world_height;
                    let time = samps[i * samp_dim + 4];
                    let u = samps[i * samp_dim + 2];
                    let v = samps[i * samp_dim + 3];
                    let mut ray = self.scene.camera.generate_ray(rx, ry, dx, dy, time, u, v);
                    ray.finalize();
                    rays.push(ray);
                    ids.push(i);
                }
            } else {
                for (i, path) in paths.iter().enumerate() {
                    if path.done {
                        continue;
                    }
                    let nn = path.inter.n.normalize();
                    let nns = if path.inter.backfacing { -nn } else { nn };

                    let mut dir = cosine_sample_hemisphere(
                        samps[i * samp_dim + so],
                        samps[i * samp_dim + so + 1],
                    );
                    let mut pdf = dir.z * 2.0;
                    if pdf < 0.001 {
                        pdf = 0.001;
                    }
                    dir = zup_to_vec(dir, nns);

                    paths[i].fcol *= (lambert(dir, nns) / pdf) as f32;

                    let origin = if nn.dot(dir.normalize()) >= 0.0 {
                        path.inter.p + path.inter.offset
                    } else {
                        path.inter.p - path.inter.offset
                    };
                    let mut ray = Ray::new(origin, dir, samps[i * samp_dim + 4]);
                    ray.ow = path.inter.owp();
                    ray.dw = 0.15;
                    ray.finalize();

                    rays.push(ray);
                    ids.push(i);
                }
            }

            intersections.clear();
            intersections.resize(rays.len(), Intersection::default());
            for (ray, inter) in rays.iter().zip(intersections.iter_mut()) {
                self.scene
                    .primitives
                    .intersect_ray(ray, inter, self.cache, self.config, self.stats);
            }

            for (slot, &id) in ids.iter().enumerate() {
                if intersections[slot].hit {
                    paths[id].inter = intersections[slot];
                } else {
                    paths[id].done = true;
                }
            }

            if !self.scene.finite_lights.is_empty() {
                self.trace_shadow_rays(&mut paths, &samps, samp_dim, so, &mut rays, &mut ids);
            }
        }

        if !self.config.no_output {
            let mut f = film.lock().unwrap();
            for (i, path) in paths.iter().enumerate() {
                let (x, y) = coords[i];
                f.add_sample(path.col, x, y);
            }
            if let Some(progress) = self.progress {
                progress.increment();
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn trace_shadow_rays(
        &self,
        paths: &mut [PathState],
        samps: &[f64],
        samp_dim: usize,
        so: usize,
        rays: &mut Vec<Ray>,
        ids: &mut Vec<usize>,
    ) {
        rays.clear();
        ids.clear();

        let light_count = self.scene.finite_lights.len();
        for (i, path) in paths.iter().enumerate() {
            if path.done {
                continue;
            }
            let pick = samps[i * samp_dim + 5 + so + 2];
            let light_idx = ((pick * light_count as f64) as usize).min(light_count - 1);
            let light = &self.scene.finite_lights[light_idx];

            let u = samps[i * samp_dim + 5 + so + 3];
            let v = samps[i * samp_dim + 5 + so + 4];
            let time = samps[i * samp_dim + 4];
            let (to_light, radiance) = light.sample(path.inter.p, u, v, time);

            let dist = to_light.magnitude();
            let dir = to_light.normalize();

            let n = path.inter.n.normalize();
            let origin = if n.dot(dir) >= 0.0 {
                path.inter.p + path.inter.offset
            } else {
                path.inter.p - path.inter.offset
            };

            let mut ray = Ray::new(origin, dir, time);
            ray.is_shadow_ray = true;
            ray.max_t = dist;
            ray.ow = path.inter.owp();
            ray.dw = path.inter.dw;
            ray.finalize();

            rays.push(ray);
            ids.push(i);
            paths[i].lcol = radiance * light_count as f32;
        }

        let mut intersections = vec![Intersection::default(); rays.len()];
        for (ray, inter) in rays.iter().zip(intersections.iter_mut()) {
            self.scene
                .primitives
                .intersect_ray(ray, inter, self.cache, self.config, self.stats);
        }

        for (slot, &id) in ids.iter().enumerate() {
            if !intersections[slot].hit {
                let path = &paths[id];
                let lam = if path.inter.backfacing {
                    lambert(rays[slot].d, -path.inter.n)
                } else {
                    lambert(rays[slot].d, path.inter.n)
                };
                let contribution = path.fcol * path.lcol * lam as f32;
                paths[id].col += contribution;
            }
        }
    }
}

/// Atomic handle used by callers who want a cheap, cooperative "render is
/// done" poll without joining the integrator's worker threads directly.
#[derive(Default)]
pub struct RenderProgress {
    blocks_done: AtomicU32,
}

impl RenderProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.blocks_done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn blocks_done(&self) -> u32 {
        self.blocks_done.load(Ordering::Relaxed)
    }
}
