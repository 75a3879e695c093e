//! Scene description: cameras, lights, and the primitive array they're shot
//! into. A `Scene` is built once via `SceneBuilder` and then handed to the
//! integrator read-only for the duration of a render.

use cgmath::InnerSpace as _;

use crate::math::{FreeCoordinate, Point, Vec3};
use crate::primitive::{Primitive, PrimArray};

/// A camera generates primary rays for a given raster offset, lens
/// coordinate, and time.
pub trait Camera: Send + Sync {
    /// `rx`/`ry` are the pixel's offset from image center in world units;
    /// `dx`/`dy` are one pixel's width/height in world units (footprint
    /// seeds); `time` is in `[0, 1]`; `u`/`v` are lens sample coordinates in
    /// `[0, 1)`, unused by a pinhole camera.
    #[allow(clippy::too_many_arguments)]
    fn generate_ray(
        &self,
        rx: FreeCoordinate,
        ry: FreeCoordinate,
        dx: FreeCoordinate,
        dy: FreeCoordinate,
        time: FreeCoordinate,
        u: FreeCoordinate,
        v: FreeCoordinate,
    ) -> crate::ray::Ray;
}

/// A light can be sampled from a surface point, returning the direction to
/// sample along (unnormalized; its length is the distance to the light) and
/// the radiance it contributes along that direction.
pub trait Light: Send + Sync {
    fn sample(
        &self,
        from: Point,
        u: FreeCoordinate,
        v: FreeCoordinate,
        time: FreeCoordinate,
    ) -> (Vec3, crate::color::Rgb);
}

/// A pinhole camera: rays converge on a single eye point with no depth of
/// field, so `u`/`v` lens coordinates are accepted but ignored.
pub struct PinholeCamera {
    eye: Point,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl PinholeCamera {
    pub fn new(eye: Point, target: Point, world_up: Vec3, focal_distance: FreeCoordinate) -> Self {
        let forward = (target - eye).normalize() * focal_distance;
        let right = forward.cross(world_up).normalize();
        let up = right.cross(forward.normalize());
        Self {
            eye,
            forward,
            right,
            up,
        }
    }
}

impl Camera for PinholeCamera {
    fn generate_ray(
        &self,
        rx: FreeCoordinate,
        ry: FreeCoordinate,
        dx: FreeCoordinate,
        dy: FreeCoordinate,
        time: FreeCoordinate,
        _u: FreeCoordinate,
        _v: FreeCoordinate,
    ) -> crate::ray::Ray {
        let dir = self.forward + self.right * rx + self.up * ry;
        let mut ray = crate::ray::Ray::new(self.eye, dir.normalize(), time);
        // Seed the ray's footprint from one pixel's world-space extent so
        // downstream `is_traceable`/`dice_rate` decisions see a real width
        // instead of the degenerate `ow = dw = 0` a bare `Ray::new` leaves.
        ray.ow = dx.max(dy);
        ray.dw = ray.ow / self.forward.magnitude();
        ray
    }
}

/// A zero-radius point light: always the same color regardless of `u`/`v`.
pub struct PointLight {
    position: Point,
    color: crate::color::Rgb,
}

impl PointLight {
    pub fn new(position: Point, color: crate::color::Rgb) -> Self {
        Self { position, color }
    }
}

impl Light for PointLight {
    fn sample(
        &self,
        from: Point,
        _u: FreeCoordinate,
        _v: FreeCoordinate,
        _time: FreeCoordinate,
    ) -> (Vec3, crate::color::Rgb) {
        let to_light = self.position - from;
        let dist2 = to_light.magnitude2().max(1e-9);
        (to_light, self.color * (1.0 / dist2) as f32)
    }
}

/// A spherical area light, uniformly sampled over the visible cap.
pub struct SphereLight {
    center: Point,
    radius: FreeCoordinate,
    color: crate::color::Rgb,
}

impl SphereLight {
    pub fn new(center: Point, radius: FreeCoordinate, color: crate::color::Rgb) -> Self {
        Self {
            center,
            radius,
            color,
        }
    }
}

impl Light for SphereLight {
    fn sample(
        &self,
        from: Point,
        u: FreeCoordinate,
        v: FreeCoordinate,
        _time: FreeCoordinate,
    ) -> (Vec3, crate::color::Rgb) {
        // Uniform point on the sphere's surface, via the standard
        // spherical-to-cartesian remap of two canonical randoms.
        let z = 1.0 - 2.0 * u;
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * std::f64::consts::PI * v;
        let offset = Vec3::new(r * phi.cos(), r * phi.sin(), z) * self.radius;
        let point_on_sphere = self.center + offset;

        let to_light = point_on_sphere - from;
        let dist2 = to_light.magnitude2().max(1e-9);
        let area = 4.0 * std::f64::consts::PI * self.radius * self.radius;
        (to_light, self.color * (area / dist2) as f32)
    }
}

/// A fully assembled scene: geometry plus the lights and camera that shoot
/// rays into it. Immutable once built.
pub struct Scene {
    pub camera: Box<dyn Camera>,
    pub finite_lights: Vec<Box<dyn Light>>,
    pub primitives: PrimArray,
}

/// Accumulates a scene's pieces before finalizing into an immutable [`Scene`].
#[derive(Default)]
pub struct SceneBuilder {
    camera: Option<Box<dyn Camera>>,
    finite_lights: Vec<Box<dyn Light>>,
    primitives: Vec<Primitive>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera(mut self, camera: impl Camera + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn light(mut self, light: impl Light + 'static) -> Self {
        self.finite_lights.push(Box::new(light));
        self
    }

    pub fn primitive(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }

    /// Consumes the builder, producing a `Scene`. Panics if no camera was
    /// set -- a scene without a camera cannot generate primary rays, so
    /// there is no sensible default.
    pub fn build(self) -> Scene {
        Scene {
            camera: self.camera.expect("scene must have a camera"),
            finite_lights: self.finite_lights,
            primitives: PrimArray::new(self.primitives),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Sphere;

    #[test]
    fn pinhole_camera_centered_ray_points_at_target() {
        let camera = PinholeCamera::new(
            Point::new(0.0, 0.0, -5.0),
            Point::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
        );
        let ray = camera.generate_ray(0.0, 0.0, 0.01, 0.01, 0.0, 0.0, 0.0);
        assert!((ray.d - Vec3::new(0.0, 0.0, 1.0)).magnitude() < 1e-9);
    }

    #[test]
    fn generated_ray_carries_a_nonzero_footprint() {
        let camera = PinholeCamera::new(
            Point::new(0.0, 0.0, -5.0),
            Point::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
        );
        let ray = camera.generate_ray(0.0, 0.0, 0.02, 0.01, 0.0, 0.0, 0.0);
        assert!(ray.ow > 0.0);
        assert!(ray.dw > 0.0);
    }

    #[test]
    fn point_light_falls_off_with_distance_squared() {
        let light = PointLight::new(Point::new(0.0, 0.0, 10.0), crate::color::Rgb::ONE);
        let (dir_near, col_near) = light.sample(Point::new(0.0, 0.0, 9.0), 0.0, 0.0, 0.0);
        let (_dir_far, col_far) = light.sample(Point::new(0.0, 0.0, 0.0), 0.0, 0.0, 0.0);
        assert!(dir_near.magnitude() < 2.0);
        assert!(col_near.r() > col_far.r());
    }

    #[test]
    fn builder_without_primitives_yields_empty_scene() {
        let scene = SceneBuilder::new()
            .camera(PinholeCamera::new(
                Point::new(0.0, 0.0, -5.0),
                Point::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                1.0,
            ))
            .build();
        assert!(scene.primitives.is_empty());
        assert!(scene.finite_lights.is_empty());
    }

    #[test]
    fn builder_carries_primitives_through() {
        let scene = SceneBuilder::new()
            .camera(PinholeCamera::new(
                Point::new(0.0, 0.0, -5.0),
                Point::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                1.0,
            ))
            .primitive(Primitive::Sphere(Sphere::new(Point::new(0.0, 0.0, 0.0), 1.0)))
            .build();
        assert_eq!(scene.primitives.len(), 1);
    }
}
