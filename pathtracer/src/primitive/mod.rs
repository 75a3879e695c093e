//! Scene primitives and the acceleration structure that traces rays against
//! them, refining lazily as footprints demand.

pub mod bilinear;
pub mod sphere;

use std::sync::RwLock;

use crate::bbox::BBoxT;
use crate::cache::GridCache;
use crate::config::Config;
use crate::math::FreeCoordinate;
use crate::ray::{Intersection, Ray};
use crate::stats::Stats;

pub use bilinear::Bilinear;
pub use sphere::Sphere;

/// Every traceable shape is one variant of this tagged union. Dispatched via
/// `match` rather than a trait object: the hot path (`PrimArray::intersect_ray`)
/// wants a flat, branch-predictable jump table over a fixed, small set of
/// shapes rather than an indirect vtable call.
#[derive(Debug)]
pub enum Primitive {
    Sphere(Sphere),
    Bilinear(Bilinear),
}

impl Primitive {
    pub fn bounds(&self) -> &BBoxT {
        match self {
            Primitive::Sphere(s) => s.bounds(),
            Primitive::Bilinear(b) => b.bounds(),
        }
    }

    pub fn is_traceable(&self, ray_width: FreeCoordinate, config: &Config) -> bool {
        match self {
            Primitive::Sphere(s) => s.is_traceable(ray_width),
            Primitive::Bilinear(b) => b.is_traceable(ray_width, config),
        }
    }

    /// Splits a non-traceable primitive into its children. Only ever called
    /// on primitives whose `is_traceable` has returned `false`; spheres
    /// always report traceable, so this is never reached for a `Sphere`.
    pub fn refine(&self, stats: &Stats) -> Vec<Primitive> {
        match self {
            Primitive::Sphere(_) => {
                unreachable!("a sphere is always traceable and never refines")
            }
            Primitive::Bilinear(b) => {
                let [a, b] = b.refine(stats);
                vec![Primitive::Bilinear(a), Primitive::Bilinear(b)]
            }
        }
    }

    pub fn intersect_ray(
        &self,
        ray: &Ray,
        intersection: &mut Intersection,
        cache: &GridCache,
        config: &Config,
        stats: &Stats,
    ) -> bool {
        match self {
            Primitive::Sphere(s) => s.intersect_ray(ray, intersection, stats),
            Primitive::Bilinear(b) => b.intersect_ray(ray, intersection, cache, config, stats),
        }
    }
}

/// Flat acceleration structure over a scene's primitives. Traversal refines
/// non-traceable primitives in place, re-examining the slot a refined
/// primitive's first child now occupies before moving on — the original
/// renderer's `i--` loop idiom, kept here as an index that isn't advanced
/// on a refine.
///
/// Backed by an `RwLock` rather than a `Mutex` so that the common case -- a
/// ray finding every primitive it touches already traceable -- only ever
/// takes a shared read lock per step, letting other workers' traversals run
/// concurrently. Only the refine/replace/append mutation takes the write
/// lock, and only for the duration of that splice.
pub struct PrimArray {
    children: RwLock<Vec<Primitive>>,
}

/// What a single array slot calls for, decided under whichever lock is held.
enum Step {
    /// `i` is past the end of the array.
    Done,
    /// The ray's bounding box missed this slot; advance past it.
    Miss,
    /// Traceable at this footprint; intersect it directly.
    Trace,
    /// Not traceable yet; must be refined before it can be traced.
    Refine,
}

fn classify(children: &[Primitive], i: usize, ray: &Ray, config: &Config) -> Step {
    if i >= children.len() {
        return Step::Done;
    }
    let (tnear, tfar) = match children[i].bounds().intersect_ray(ray) {
        Some(bounds) => bounds,
        None => return Step::Miss,
    };
    let width = ray.min_width(tnear, tfar);
    if children[i].is_traceable(width, config) {
        Step::Trace
    } else {
        Step::Refine
    }
}

impl PrimArray {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            children: RwLock::new(primitives),
        }
    }

    pub fn len(&self) -> usize {
        self.children.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Traces `ray` against every root primitive, refining any that aren't
    /// yet traceable at the ray's footprint until a leaf handles it. Shadow
    /// rays stop at the first hit.
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        intersection: &mut Intersection,
        cache: &GridCache,
        config: &Config,
        stats: &Stats,
    ) -> bool {
        let mut hit = false;
        let mut i = 0;

        loop {
            {
                let children = self.children.read().unwrap();
                match classify(&children, i, ray, config) {
                    Step::Done => break,
                    Step::Miss => {
                        i += 1;
                        continue;
                    }
                    Step::Trace => {
                        hit |= children[i].intersect_ray(ray, intersection, cache, config, stats);
                        if hit && ray.is_shadow_ray {
                            break;
                        }
                        i += 1;
                        continue;
                    }
                    Step::Refine => {}
                }
            }

            let mut children = self.children.write().unwrap();
            // Another traversal may have refined (or otherwise changed) this
            // slot while we waited for the write lock; reclassify rather than
            // assume our stale read still holds.
            match classify(&children, i, ray, config) {
                Step::Done => break,
                Step::Miss => {
                    i += 1;
                    continue;
                }
                Step::Trace => continue,
                Step::Refine => {}
            }

            let mut replacement = children[i].refine(stats);
            assert!(!replacement.is_empty(), "refine must produce at least one child");
            let first = replacement.remove(0);
            children[i] = first;
            children.extend(replacement);
            // re-examine slot `i`, which now holds the first new child
        }

        hit
    }
}
