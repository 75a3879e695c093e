//! Bilinear patch primitive: refines (splits in two) until its projected
//! footprint is small enough to dice into a traceable micropolygon grid.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use cgmath::InnerSpace as _;

use crate::bbox::{Aabb, BBoxT};
use crate::cache::{GridCache, GridKey};
use crate::config::Config;
use crate::grid::Grid;
use crate::math::{FreeCoordinate, Point};
use crate::ray::{Intersection, Ray};
use crate::stats::Stats;

/// Four control points per time sample, in the winding
/// `v0`-`v1`-`v2`-`v3`: `v0`-`v1` and `v3`-`v2` are the u-edges,
/// `v0`-`v3` and `v1`-`v2` are the v-edges.
#[derive(Debug)]
pub struct Bilinear {
    verts: Vec<[Point; 4]>,
    bbox: BBoxT,
    grid_key: Mutex<Option<GridKey>>,
    /// Bit-cast `f32` footprint width this patch was last confirmed
    /// traceable at; an atomic so concurrent traversals can memoize the
    /// `is_traceable` check without a lock.
    last_rayw: AtomicU32,
}

impl Bilinear {
    pub fn new(v0: Point, v1: Point, v2: Point, v3: Point) -> Self {
        Self::with_time_samples(vec![[v0, v1, v2, v3]])
    }

    pub fn with_time_samples(verts: Vec<[Point; 4]>) -> Self {
        assert!(!verts.is_empty());
        let samples = verts
            .iter()
            .map(|quad| {
                let mut min = quad[0];
                let mut max = quad[0];
                for &v in &quad[1..] {
                    min.x = min.x.min(v.x);
                    min.y = min.y.min(v.y);
                    min.z = min.z.min(v.z);
                    max.x = max.x.max(v.x);
                    max.y = max.y.max(v.y);
                    max.z = max.z.max(v.z);
                }
                Aabb { min, max }
            })
            .collect();
        Self {
            verts,
            bbox: BBoxT::new(samples),
            grid_key: Mutex::new(None),
            last_rayw: AtomicU32::new(f32::MAX.to_bits()),
        }
    }

    pub fn bounds(&self) -> &BBoxT {
        &self.bbox
    }

    fn edge_lengths(&self) -> (FreeCoordinate, FreeCoordinate) {
        let [v0, v1, v2, v3] = self.verts[0];
        let lu = (v0 - v1).magnitude() + (v3 - v2).magnitude();
        let lv = (v0 - v3).magnitude() + (v1 - v2).magnitude();
        (lu, lv)
    }

    /// Vertex-count-per-edge to dice at, given the footprint width a ray
    /// would see this patch at.
    fn dice_rate(&self, upoly_width: FreeCoordinate, config: &Config) -> u32 {
        if upoly_width <= 0.0 {
            return 1 + 8;
        }
        let size = self.bbox.union_over_time().diagonal_length() / 1.4;
        let rate = 1 + (size / (upoly_width * config.dice_rate)) as u32;
        rate.max(2)
    }

    /// True once this patch's footprint is small enough, and square enough,
    /// to dice directly rather than split. Memoizes the last ray width it
    /// was confirmed at so repeated traversals from similarly-scaled rays
    /// skip the edge-ratio recomputation.
    pub fn is_traceable(&self, ray_width: FreeCoordinate, config: &Config) -> bool {
        let last = f32::from_bits(self.last_rayw.load(Ordering::Relaxed)) as FreeCoordinate;
        if !(ray_width < last && ray_width > 0.0) {
            return true;
        }

        let (lu, lv) = self.edge_lengths();
        let edge_ratio = lu / lv;
        let rate = self.dice_rate(ray_width, config);

        if rate <= config.max_grid_size && (0.75..=1.5).contains(&edge_ratio) {
            self.last_rayw
                .store((ray_width as f32).to_bits(), Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Splits along the longer pair of edges, producing two patches that
    /// together cover the same surface and time range as `self`.
    pub fn refine(&self, stats: &Stats) -> [Bilinear; 2] {
        stats.record_split();
        let (lu, lv) = self.edge_lengths();

        let mut a = Vec::with_capacity(self.verts.len());
        let mut b = Vec::with_capacity(self.verts.len());

        for &[v0, v1, v2, v3] in &self.verts {
            if lu > lv {
                let mid01 = midpoint(v0, v1);
                let mid32 = midpoint(v3, v2);
                a.push([v0, mid01, mid32, v3]);
                b.push([mid01, v1, v2, mid32]);
            } else {
                let mid12 = midpoint(v1, v2);
                let mid30 = midpoint(v3, v0);
                a.push([v0, v1, mid12, mid30]);
                b.push([mid30, mid12, v2, v3]);
            }
        }

        [Self::with_time_samples(a), Self::with_time_samples(b)]
    }

    /// Dices into (or fetches from cache) a micropolygon grid and traces
    /// against it.
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        intersection: &mut Intersection,
        cache: &GridCache,
        config: &Config,
        stats: &Stats,
    ) -> bool {
        let existing = *self.grid_key.lock().unwrap();
        let grid = match existing.filter(|&key| cache.exists(key)) {
            Some(key) => cache.touch(key),
            None => {
                let (tnear, tfar) = match self.bbox.intersect_ray(ray) {
                    Some(bounds) => bounds,
                    None => return false,
                };
                let rate = self.dice_rate(ray.min_width(tnear, tfar), config);
                let grid = Grid::dice(rate as usize, rate as usize, &self.verts, stats);
                let key = cache.insert(grid);
                *self.grid_key.lock().unwrap() = Some(key);
                cache.touch(key)
            }
        };

        match grid {
            Some(grid) => grid.intersect_ray(ray, intersection),
            None => false,
        }
    }
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5, (a.z + b.z) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn flat_patch() -> Bilinear {
        Bilinear::new(
            Point::new(-1.0, -1.0, 0.0),
            Point::new(1.0, -1.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(-1.0, 1.0, 0.0),
        )
    }

    #[test]
    fn coarse_footprint_is_immediately_traceable() {
        let patch = flat_patch();
        let config = Config::default();
        assert!(patch.is_traceable(1.0, &config));
    }

    #[test]
    fn refine_splits_into_two_patches_covering_original_bounds() {
        let patch = flat_patch();
        let stats = Stats::new();
        let [a, b] = patch.refine(&stats);
        let union = a.bounds().union_over_time().union(b.bounds().union_over_time());
        let original = patch.bounds().union_over_time();
        assert!((union.min.x - original.min.x).abs() < 1e-9);
        assert!((union.max.x - original.max.x).abs() < 1e-9);
        assert_eq!(stats.split_count(), 1);
    }

    #[test]
    fn intersect_ray_dices_once_and_reuses_cached_grid() {
        let patch = flat_patch();
        let cache = GridCache::new(16);
        let config = Config::default();
        let stats = Stats::new();

        let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        let mut inter = Intersection::default();
        assert!(patch.intersect_ray(&ray, &mut inter, &cache, &config, &stats));
        assert_eq!(cache.len(), 1);

        let mut inter2 = Intersection::default();
        assert!(patch.intersect_ray(&ray, &mut inter2, &cache, &config, &stats));
        assert_eq!(cache.len(), 1);
    }
}
