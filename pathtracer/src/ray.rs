//! Ray and intersection records.
//!
//! A ray carries, alongside the usual origin/direction/time, two footprint
//! quantities (`ow`, `dw`) that every traceability decision downstream is
//! driven by. Rays are "finalized" once after construction to precompute the
//! direction reciprocals and sign bits the bounding-box slab test wants, so
//! that cost isn't paid per box tested.

use crate::math::{FreeCoordinate, Point, Vec3};
use crate::color::Rgb;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub o: Point,
    pub d: Vec3,
    pub time: FreeCoordinate,
    pub max_t: FreeCoordinate,
    pub is_shadow_ray: bool,

    /// Footprint width at the ray's origin.
    pub ow: FreeCoordinate,
    /// Footprint divergence per unit length travelled.
    pub dw: FreeCoordinate,

    /// `1 / d` per axis, precomputed by [`Ray::finalize`].
    pub(crate) inv_d: Vec3,
    /// Sign bit per axis (`true` if negative), precomputed by [`Ray::finalize`].
    pub(crate) sign: [bool; 3],
}

impl Ray {
    pub fn new(o: Point, d: Vec3, time: FreeCoordinate) -> Self {
        let mut ray = Self {
            o,
            d,
            time,
            max_t: FreeCoordinate::INFINITY,
            is_shadow_ray: false,
            ow: 0.0,
            dw: 0.0,
            inv_d: Vec3::new(0.0, 0.0, 0.0),
            sign: [false; 3],
        };
        ray.finalize();
        ray
    }

    /// Precomputes the slab-test helpers. Must be called (or re-called)
    /// whenever `d` changes; constructing via [`Ray::new`] already does this.
    pub fn finalize(&mut self) {
        self.inv_d = Vec3::new(1.0 / self.d.x, 1.0 / self.d.y, 1.0 / self.d.z);
        self.sign = [self.inv_d.x < 0.0, self.inv_d.y < 0.0, self.inv_d.z < 0.0];
    }

    /// Smallest footprint width along the `[tnear, tfar]` segment of this ray.
    #[inline]
    pub fn min_width(&self, tnear: FreeCoordinate, tfar: FreeCoordinate) -> FreeCoordinate {
        let near = (self.ow + self.dw * tnear).max(0.0);
        let far = (self.ow + self.dw * tfar).max(0.0);
        near.min(far)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub hit: bool,
    pub t: FreeCoordinate,
    pub p: Point,
    pub n: Vec3,
    pub incoming: Vec3,
    /// Offset applied to a spawned ray's origin to escape the surface and
    /// avoid self-intersection ("shadow acne").
    pub offset: Vec3,
    pub backfacing: bool,
    pub color: Rgb,
    /// Footprint width propagated to rays spawned from this intersection.
    pub ow: FreeCoordinate,
    pub dw: FreeCoordinate,
}

impl Default for Intersection {
    fn default() -> Self {
        Self {
            hit: false,
            t: FreeCoordinate::INFINITY,
            p: Point::new(0.0, 0.0, 0.0),
            n: Vec3::new(0.0, 0.0, 1.0),
            incoming: Vec3::new(0.0, 0.0, 0.0),
            offset: Vec3::new(0.0, 0.0, 0.0),
            backfacing: false,
            color: Rgb::ZERO,
            ow: 0.0,
            dw: 0.0,
        }
    }
}

impl Intersection {
    /// Footprint width at the intersection point, used as the `ow` of rays
    /// spawned from here. Named to mirror the original renderer's `owp()`.
    #[inline]
    pub fn owp(&self) -> FreeCoordinate {
        self.ow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_width_picks_smaller_endpoint() {
        let ray = Ray {
            ow: 0.1,
            dw: 0.5,
            ..Ray::new(Point::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 0.0)
        };
        // Width grows with t, so the near endpoint should win.
        assert!((ray.min_width(1.0, 2.0) - (0.1 + 0.5 * 1.0)).abs() < 1e-9);
    }

    #[test]
    fn finalize_precomputes_inverse_direction() {
        let mut ray = Ray::new(Point::new(0.0, 0.0, 0.0), Vec3::new(2.0, -2.0, 0.5), 0.0);
        ray.finalize();
        assert!((ray.inv_d.x - 0.5).abs() < 1e-9);
        assert!(ray.sign[1]);
        assert!(!ray.sign[0]);
    }
}
