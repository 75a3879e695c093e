//! Time-sampled axis-aligned bounding boxes.
//!
//! A `BBoxT` is an ordered sequence of per-time-sample AABBs; ray-box
//! intersection interpolates the box at the ray's time before running the
//! usual slab test, reusing the direction reciprocals the ray precomputed in
//! [`crate::ray::Ray::finalize`].

use crate::math::{FreeCoordinate, Point};
use crate::ray::Ray;
use crate::timesample::query_time;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    pub fn union(self, other: Self) -> Self {
        Self {
            min: Point::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    fn lerp(a: Self, b: Self, alpha: FreeCoordinate) -> Self {
        Self {
            min: Point::new(
                a.min.x + (b.min.x - a.min.x) * alpha,
                a.min.y + (b.min.y - a.min.y) * alpha,
                a.min.z + (b.min.z - a.min.z) * alpha,
            ),
            max: Point::new(
                a.max.x + (b.max.x - a.max.x) * alpha,
                a.max.y + (b.max.y - a.max.y) * alpha,
                a.max.z + (b.max.z - a.max.z) * alpha,
            ),
        }
    }

    /// Diagonal length, used by the bilinear patch's dice-rate heuristic.
    pub fn diagonal_length(&self) -> FreeCoordinate {
        use cgmath::{EuclideanSpace as _, InnerSpace as _};
        (self.max.to_vec() - self.min.to_vec()).magnitude()
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// A bounding box that may vary over the `[0, 1]` time domain, sampled at
/// discrete points and interpolated linearly between them.
#[derive(Clone, Debug)]
pub struct BBoxT {
    samples: Vec<Aabb>,
}

impl BBoxT {
    pub fn new(samples: Vec<Aabb>) -> Self {
        assert!(!samples.is_empty(), "a bounding box must have at least one time sample");
        Self { samples }
    }

    pub fn single(aabb: Aabb) -> Self {
        Self { samples: vec![aabb] }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// The bounding box interpolated to the given time in `[0, 1]`.
    pub fn at_time(&self, time: FreeCoordinate) -> Aabb {
        let q = query_time(self.samples.len(), time);
        if q.ia == q.ib {
            self.samples[q.ia]
        } else {
            Aabb::lerp(self.samples[q.ia], self.samples[q.ib], q.alpha)
        }
    }

    /// Union of all per-time-sample boxes; used to report the primitive
    /// array's overall bounds.
    pub fn union_over_time(&self) -> Aabb {
        let mut acc = self.samples[0];
        for &s in &self.samples[1..] {
            acc = acc.union(s);
        }
        acc
    }

    /// Ray/box slab test against the box interpolated at `ray.time`.
    /// Returns `(tnear, tfar)` if the ray's segment `[0, max_t]` intersects.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(FreeCoordinate, FreeCoordinate)> {
        let aabb = self.at_time(ray.time);

        let bounds = [aabb.min, aabb.max];
        let mut tmin = (bounds[ray.sign[0] as usize].x - ray.o.x) * ray.inv_d.x;
        let mut tmax = (bounds[1 - ray.sign[0] as usize].x - ray.o.x) * ray.inv_d.x;
        let tymin = (bounds[ray.sign[1] as usize].y - ray.o.y) * ray.inv_d.y;
        let tymax = (bounds[1 - ray.sign[1] as usize].y - ray.o.y) * ray.inv_d.y;
        if tmin > tymax || tymin > tmax {
            return None;
        }
        if tymin > tmin {
            tmin = tymin;
        }
        if tymax < tmax {
            tmax = tymax;
        }

        let tzmin = (bounds[ray.sign[2] as usize].z - ray.o.z) * ray.inv_d.z;
        let tzmax = (bounds[1 - ray.sign[2] as usize].z - ray.o.z) * ray.inv_d.z;
        if tmin > tzmax || tzmin > tmax {
            return None;
        }
        if tzmin > tmin {
            tmin = tzmin;
        }
        if tzmax < tmax {
            tmax = tzmax;
        }

        if tmax < 0.0 || tmin > ray.max_t {
            return None;
        }
        Some((tmin.max(0.0), tmax))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn unit_box() -> BBoxT {
        BBoxT::single(Aabb {
            min: Point::new(-1.0, -1.0, -1.0),
            max: Point::new(1.0, 1.0, 1.0),
        })
    }

    #[test]
    fn ray_through_center_hits() {
        let bbox = unit_box();
        let ray = Ray::new(Point::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.0);
        let (tnear, tfar) = bbox.intersect_ray(&ray).expect("should hit");
        assert!((tnear - 4.0).abs() < 1e-9);
        assert!((tfar - 6.0).abs() < 1e-9);
    }

    #[test]
    fn ray_missing_box_reports_none() {
        let bbox = unit_box();
        let ray = Ray::new(Point::new(-5.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.0);
        assert!(bbox.intersect_ray(&ray).is_none());
    }

    #[test]
    fn union_covers_both_boxes() {
        let a = Aabb {
            min: Point::new(0.0, 0.0, 0.0),
            max: Point::new(1.0, 1.0, 1.0),
        };
        let b = Aabb {
            min: Point::new(2.0, -1.0, 0.0),
            max: Point::new(3.0, 0.5, 1.0),
        };
        let u = a.union(b);
        assert!(u.contains_point(Point::new(0.5, 0.5, 0.5)));
        assert!(u.contains_point(Point::new(2.5, -0.5, 0.5)));
    }
}
