//! Color data types.
//!
//! Same `Rgb`/`Rgba` split and componentwise arithmetic as a voxel engine's
//! color module, but without a `NotNan` wrapper: this renderer's colors are
//! summed and scaled once per ray segment in the hottest loop in the
//! program, and a banned-NaN invariant is only useful to make block colors
//! `Eq + Hash`-able, a property this renderer never needs. See `DESIGN.md`.

use cgmath::{ElementWise as _, Vector3, Vector4};
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

/// A linear (gamma = 1) floating-point RGB color. Components are nominally
/// in `[0, 1]` but over-bright values are permitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(Vector3<f32>);

/// A linear RGB color with a non-premultiplied alpha channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba(Vector4<f32>);

impl Rgb {
    pub const ZERO: Rgb = Rgb(Vector3::new(0.0, 0.0, 0.0));
    pub const ONE: Rgb = Rgb(Vector3::new(1.0, 1.0, 1.0));

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self(Vector3::new(r, g, b))
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub const fn with_alpha(self, a: f32) -> Rgba {
        Rgba(Vector4::new(self.0.x, self.0.y, self.0.z, a))
    }

    #[inline]
    pub const fn with_alpha_one(self) -> Rgba {
        self.with_alpha(1.0)
    }

    #[inline]
    pub fn r(self) -> f32 {
        self.0.x
    }
    #[inline]
    pub fn g(self) -> f32 {
        self.0.y
    }
    #[inline]
    pub fn b(self) -> f32 {
        self.0.z
    }

    /// `true` if every component is within `eps` of zero.
    #[inline]
    pub fn is_near_zero(self, eps: f32) -> bool {
        self.0.x.abs() < eps && self.0.y.abs() < eps && self.0.z.abs() < eps
    }
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba(Vector4::new(0.0, 0.0, 0.0, 0.0));
    pub const BLACK: Rgba = Rgba(Vector4::new(0.0, 0.0, 0.0, 1.0));
    pub const WHITE: Rgba = Rgba(Vector4::new(1.0, 1.0, 1.0, 1.0));

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(Vector4::new(r, g, b, a))
    }

    #[inline]
    pub fn alpha(self) -> f32 {
        self.0.w
    }

    #[inline]
    pub fn fully_transparent(self) -> bool {
        self.alpha() <= 0.0
    }

    #[inline]
    pub fn fully_opaque(self) -> bool {
        self.alpha() >= 1.0
    }

    #[inline]
    pub fn to_rgb(self) -> Rgb {
        Rgb(self.0.truncate())
    }
}

impl From<Vector3<f32>> for Rgb {
    fn from(v: Vector3<f32>) -> Self {
        Self(v)
    }
}
impl From<Rgb> for Vector3<f32> {
    fn from(c: Rgb) -> Self {
        c.0
    }
}

impl Add for Rgb {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self(self.0 + o.0)
    }
}
impl AddAssign for Rgb {
    #[inline]
    fn add_assign(&mut self, o: Self) {
        self.0 += o.0;
    }
}
impl Sub for Rgb {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Self(self.0 - o.0)
    }
}
impl Mul for Rgb {
    type Output = Self;
    /// Componentwise multiplication (filtering one color by another).
    #[inline]
    fn mul(self, o: Self) -> Self {
        Self(self.0.mul_element_wise(o.0))
    }
}
impl Mul<f32> for Rgb {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self(self.0 * scalar)
    }
}
impl Mul<f64> for Rgb {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Self(self.0 * scalar as f32)
    }
}
impl MulAssign for Rgb {
    #[inline]
    fn mul_assign(&mut self, o: Self) {
        self.0 = self.0.mul_element_wise(o.0);
    }
}
impl MulAssign<f32> for Rgb {
    #[inline]
    fn mul_assign(&mut self, scalar: f32) {
        self.0 *= scalar;
    }
}

impl Add for Rgba {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self(self.0 + o.0)
    }
}
impl AddAssign for Rgba {
    #[inline]
    fn add_assign(&mut self, o: Self) {
        self.0 += o.0;
    }
}

impl Default for Rgb {
    #[inline]
    fn default() -> Self {
        Self::ZERO
    }
}
impl Default for Rgba {
    #[inline]
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_add_and_scale() {
        let a = Rgb::new(0.1, 0.2, 0.3);
        let b = Rgb::new(0.0, 0.1, 0.0);
        let sum = a + b;
        assert!((sum.g() - 0.3).abs() < 1e-6);
        let scaled = a * 2.0f32;
        assert!((scaled.r() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn rgba_alpha_predicates() {
        assert!(Rgba::TRANSPARENT.fully_transparent());
        assert!(Rgba::WHITE.fully_opaque());
        assert!(!Rgba::new(1.0, 1.0, 1.0, 0.5).fully_opaque());
    }
}
