//! Scalar types and small numeric helpers shared across the renderer.
//!
//! World-space geometry uses `f64` (named [`FreeCoordinate`] for clarity at
//! call sites), while color stays in `f32` since it never needs more
//! precision than the output image can show.

use cgmath::{Point3, Vector3};

/// World-space scalar type. An alias rather than a newtype so that `cgmath`'s
/// trait impls apply without wrapping.
pub type FreeCoordinate = f64;

pub type Point = Point3<FreeCoordinate>;
pub type Vec3 = Vector3<FreeCoordinate>;

/// Smallest epsilon below which ray parametric distances are treated as
/// self-intersection noise rather than a genuine hit.
pub const T_EPSILON: FreeCoordinate = 1e-4;

/// Linear interpolation between `a` and `b` by `t`, for any type `cgmath`
/// already knows how to scale and add.
#[inline]
pub fn lerp<T>(t: FreeCoordinate, a: T, b: T) -> T
where
    T: std::ops::Mul<FreeCoordinate, Output = T> + std::ops::Add<Output = T>,
{
    a * (1.0 - t) + b * t
}

/// Cosine-weighted sample of the unit hemisphere around `+z`, from two
/// canonical `[0, 1)` random numbers.
///
/// `z` is returned as `cos(theta)` directly so callers can reuse it for the
/// (deliberately non-canonical, see `DESIGN.md`) hemisphere PDF.
#[inline]
pub fn cosine_sample_hemisphere(u1: f64, u2: f64) -> Vec3 {
    let r = u1.sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;
    let x = r * theta.cos();
    let y = r * theta.sin();
    let z = (1.0 - u1).max(0.0).sqrt();
    Vec3::new(x, y, z)
}

/// Rotates a direction generated in the canonical `+z`-up hemisphere frame
/// (as produced by [`cosine_sample_hemisphere`]) into the frame whose "up" is
/// `up`.
#[inline]
pub fn zup_to_vec(dir: Vec3, up: Vec3) -> Vec3 {
    use cgmath::InnerSpace as _;

    let up = up.normalize();
    // Any vector not parallel to `up` will do to seed the basis.
    let seed = if up.x.abs() < 0.9 {
        Vec3::new(1.0, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 1.0, 0.0)
    };
    let tangent = up.cross(seed).normalize();
    let bitangent = up.cross(tangent);
    tangent * dir.x + bitangent * dir.y + up * dir.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zup_preserves_up_axis() {
        use cgmath::InnerSpace as _;
        let up = Vec3::new(0.0, 0.0, 1.0);
        let straight_up = zup_to_vec(Vec3::new(0.0, 0.0, 1.0), up);
        assert!((straight_up - up).magnitude() < 1e-9);
    }
}
