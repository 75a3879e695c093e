//! Sphere primitive: always traceable, never refines.

use cgmath::InnerSpace as _;

use crate::bbox::{Aabb, BBoxT};
use crate::color::Rgb;
use crate::math::{lerp, FreeCoordinate, Point, T_EPSILON};
use crate::ray::{Intersection, Ray};
use crate::stats::Stats;
use crate::timesample::query_time;

#[derive(Clone, Debug)]
pub struct Sphere {
    center: Vec<Point>,
    radius: Vec<FreeCoordinate>,
    bbox: BBoxT,
}

impl Sphere {
    /// A sphere with a single, static time sample.
    pub fn new(center: Point, radius: FreeCoordinate) -> Self {
        Self::with_time_samples(vec![center], vec![radius])
    }

    /// A sphere whose center and radius are given per time sample, for
    /// motion blur.
    pub fn with_time_samples(center: Vec<Point>, radius: Vec<FreeCoordinate>) -> Self {
        assert_eq!(center.len(), radius.len());
        assert!(!center.is_empty());
        let samples = center
            .iter()
            .zip(&radius)
            .map(|(&c, &r)| Aabb {
                min: Point::new(c.x - r, c.y - r, c.z - r),
                max: Point::new(c.x + r, c.y + r, c.z + r),
            })
            .collect();
        Self {
            center,
            radius,
            bbox: BBoxT::new(samples),
        }
    }

    pub fn bounds(&self) -> &BBoxT {
        &self.bbox
    }

    /// A sphere is always a terminal, traceable primitive.
    pub fn is_traceable(&self, _ray_width: FreeCoordinate) -> bool {
        true
    }

    fn center_radius_at(&self, time: FreeCoordinate) -> (Point, FreeCoordinate) {
        let q = query_time(self.center.len(), time);
        if q.ia == q.ib {
            (self.center[q.ia], self.radius[q.ia])
        } else {
            (
                lerp(q.alpha, self.center[q.ia], self.center[q.ib]),
                lerp(q.alpha, self.radius[q.ia], self.radius[q.ib]),
            )
        }
    }

    /// Stable-quadratic ray/sphere intersection, following the well-known
    /// numerically stable form (`q = -0.5*(b +/- sqrt(disc))`, `t0 = q/a`,
    /// `t1 = c/q`) rather than the textbook `(-b +/- sqrt(disc)) / 2a`.
    pub fn intersect_ray(&self, ray: &Ray, intersection: &mut Intersection, stats: &Stats) -> bool {
        stats.record_ray_test();

        let (center, radius) = self.center_radius_at(ray.time);
        let o = ray.o - center;
        let d = ray.d;

        let a = d.magnitude2();
        let b = 2.0 * d.dot(o);
        let c = o.magnitude2() - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return false;
        }
        let discriminant = discriminant.sqrt();

        let q = if b < 0.0 {
            -0.5 * (b - discriminant)
        } else {
            -0.5 * (b + discriminant)
        };

        let t0 = q / a;
        let t1 = if q != 0.0 { c / q } else { ray.max_t };
        let (t0, t1) = if t0 > t1 { (t1, t0) } else { (t0, t1) };

        if t0 >= ray.max_t || t1 < T_EPSILON {
            return false;
        }

        let t = if t0 >= T_EPSILON {
            t0
        } else if t1 < ray.max_t {
            t1
        } else {
            return false;
        };

        if t > intersection.t {
            return false;
        }

        let p = ray.o + ray.d * t;
        let n = (p - center).normalize();

        intersection.hit = true;
        intersection.t = t;
        intersection.p = p;
        intersection.n = n;
        intersection.incoming = ray.d;
        intersection.offset = n * 1e-4;
        intersection.backfacing = n.dot(ray.d) > 0.0;
        intersection.ow = ray.ow + ray.dw * t;
        intersection.dw = ray.dw;
        intersection.color = Rgb::new(
            ((n.x + 1.0) / 2.0) as f32,
            ((n.y + 1.0) / 2.0) as f32,
            ((n.z + 1.0) / 2.0) as f32,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn ray_through_center_hits_near_surface() {
        let sphere = Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0);
        let stats = Stats::new();
        let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        let mut inter = Intersection::default();
        assert!(sphere.intersect_ray(&ray, &mut inter, &stats));
        assert!((inter.t - 4.0).abs() < 1e-9);
        assert_eq!(stats.primitive_ray_tests(), 1);
    }

    #[test]
    fn ray_inside_sphere_exits_through_far_side() {
        let sphere = Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0);
        let stats = Stats::new();
        let ray = Ray::new(Point::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        let mut inter = Intersection::default();
        assert!(sphere.intersect_ray(&ray, &mut inter, &stats));
        assert!((inter.t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ray_missing_sphere_does_not_hit() {
        let sphere = Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0);
        let stats = Stats::new();
        let ray = Ray::new(Point::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        let mut inter = Intersection::default();
        assert!(!sphere.intersect_ray(&ray, &mut inter, &stats));
    }

    #[test]
    fn hit_propagates_footprint_from_the_ray() {
        let sphere = Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0);
        let stats = Stats::new();
        let mut ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        ray.ow = 0.1;
        ray.dw = 0.02;
        let mut inter = Intersection::default();
        assert!(sphere.intersect_ray(&ray, &mut inter, &stats));
        assert!((inter.ow - (0.1 + 0.02 * 4.0)).abs() < 1e-9);
        assert!((inter.dw - 0.02).abs() < 1e-9);
    }

    #[test]
    fn moving_sphere_is_sampled_at_ray_time() {
        let sphere = Sphere::with_time_samples(
            vec![Point::new(-5.0, 0.0, 0.0), Point::new(5.0, 0.0, 0.0)],
            vec![1.0, 1.0],
        );
        let stats = Stats::new();
        let mut ray = Ray::new(Point::new(5.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0), 1.0);
        ray.max_t = FreeCoordinate::INFINITY;
        let mut inter = Intersection::default();
        assert!(sphere.intersect_ray(&ray, &mut inter, &stats));
        assert!((inter.t - 9.0).abs() < 1e-9);
    }
}
