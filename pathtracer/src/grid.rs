//! Micropolygon grids: the tessellated form a bilinear patch is lazily diced
//! into. A grid is always traceable and never refines further — it's the
//! leaf of the lazy-dicing process.

use crate::bbox::{Aabb, BBoxT};
use crate::math::{FreeCoordinate, Point, Vec3};
use crate::ray::{Intersection, Ray};
use crate::stats::Stats;
use crate::timesample::query_time;

/// One vertex of a diced grid, at one time sample.
#[derive(Clone, Copy, Debug)]
pub struct GridVertex {
    pub p: Point,
    pub n: Vec3,
}

/// A `ru x rv` tessellation of a bilinear patch, one such array per time
/// sample. Constructed once by [`crate::primitive::bilinear::Bilinear::dice`]
/// and then owned exclusively by the grid cache.
#[derive(Debug)]
pub struct Grid {
    pub ru: usize,
    pub rv: usize,
    /// `verts[time][rv * x + y]`, matching the original renderer's row-major
    /// layout (`ru*y+x` when walked by u then v -- see `index`).
    verts: Vec<Vec<GridVertex>>,
    bbox: BBoxT,
}

impl Grid {
    /// Index of vertex `(x, y)` within a single time sample's flat array.
    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        self.ru * y + x
    }

    /// Builds a grid by bilinearly tessellating `state_count` time samples of
    /// a four-point control quad (`corners[time] = [v0, v1, v2, v3]`, in the
    /// same winding the bilinear patch uses: `v0`-`v1` and `v3`-`v2` are the
    /// u-edges, `v0`-`v3` and `v1`-`v2` are the v-edges).
    pub fn dice(ru: usize, rv: usize, corners: &[[Point; 4]], stats: &Stats) -> Self {
        assert!(ru >= 2 && rv >= 2, "a grid must have at least 2x2 vertices");
        let state_count = corners.len();
        let mut verts = vec![vec![
            GridVertex {
                p: Point::new(0.0, 0.0, 0.0),
                n: Vec3::new(0.0, 0.0, 1.0)
            };
            ru * rv
        ]; state_count];

        for (time, quad) in corners.iter().enumerate() {
            let [v0, v1, v2, v3] = *quad;
            let du1 = (v1 - v0) / (ru - 1) as FreeCoordinate;
            let du2 = (v2 - v3) / (ru - 1) as FreeCoordinate;

            let mut p1 = v0;
            let mut p2 = v3;
            for x in 0..ru {
                let dv = (p2 - p1) / (rv - 1) as FreeCoordinate;
                let mut p3 = p1;
                for y in 0..rv {
                    let idx = ru * y + x;
                    verts[time][idx].p = p3;
                    p3 += dv;
                }
                p1 += du1;
                p2 += du2;
            }
        }

        let mut grid = Self {
            ru,
            rv,
            verts,
            bbox: BBoxT::single(Aabb {
                min: Point::new(0.0, 0.0, 0.0),
                max: Point::new(0.0, 0.0, 0.0),
            }),
        };
        grid.calc_normals();
        grid.finalize();
        stats.record_upoly_gen(((ru - 1) * (rv - 1)) as u64);
        grid
    }

    /// Computes per-vertex normals from neighbouring vertices: central
    /// differences in the interior, one-sided differences at the border.
    fn calc_normals(&mut self) {
        use cgmath::InnerSpace as _;

        let ru = self.ru;
        let rv = self.rv;
        for time_verts in self.verts.iter_mut() {
            let positions: Vec<Point> = time_verts.iter().map(|v| v.p).collect();
            let at = |x: usize, y: usize| positions[ru * y + x];

            let mut normals = vec![Vec3::new(0.0, 0.0, 1.0); ru * rv];
            for x in 0..ru {
                for y in 0..rv {
                    let x_minus = x.saturating_sub(1);
                    let x_plus = (x + 1).min(ru - 1);
                    let y_minus = y.saturating_sub(1);
                    let y_plus = (y + 1).min(rv - 1);

                    let du = at(x_plus, y) - at(x_minus, y);
                    let dv = at(x, y_plus) - at(x, y_minus);

                    let n = du.cross(dv);
                    normals[ru * y + x] = if n.magnitude2() > 1e-18 {
                        n.normalize()
                    } else {
                        Vec3::new(0.0, 0.0, 1.0)
                    };
                }
            }

            for (vertex, n) in time_verts.iter_mut().zip(normals) {
                vertex.n = n;
            }
        }
    }

    /// Precomputes the bounding box over all time samples.
    fn finalize(&mut self) {
        let mut samples = Vec::with_capacity(self.verts.len());
        for time_verts in &self.verts {
            let mut min = time_verts[0].p;
            let mut max = time_verts[0].p;
            for v in &time_verts[1..] {
                min.x = min.x.min(v.p.x);
                min.y = min.y.min(v.p.y);
                min.z = min.z.min(v.p.z);
                max.x = max.x.max(v.p.x);
                max.y = max.y.max(v.p.y);
                max.z = max.z.max(v.p.z);
            }
            samples.push(Aabb { min, max });
        }
        self.bbox = BBoxT::new(samples);
    }

    pub fn bounds(&self) -> &BBoxT {
        &self.bbox
    }

    /// A grid never needs to be refined further; it is always traceable.
    pub fn is_traceable(&self, _ray_width: FreeCoordinate) -> bool {
        true
    }

    fn vertex_at_time(&self, x: usize, y: usize, ia: usize, ib: usize, alpha: f64) -> GridVertex {
        let a = self.verts[ia][self.index(x, y)];
        let b = self.verts[ib][self.index(x, y)];
        if ia == ib {
            a
        } else {
            GridVertex {
                p: a.p + (b.p - a.p) * alpha,
                n: a.n + (b.n - a.n) * alpha,
            }
        }
    }

    /// Ray-tests every micropolygon, each as a pair of triangles sharing the
    /// `(x,y)`-`(x+1,y+1)` diagonal, reporting the nearest hit.
    pub fn intersect_ray(&self, ray: &Ray, intersection: &mut Intersection) -> bool {
        if self.bbox.intersect_ray(ray).is_none() {
            return false;
        }

        let q = query_time(self.verts.len(), ray.time);
        let mut hit_any = false;

        for x in 0..self.ru - 1 {
            for y in 0..self.rv - 1 {
                let v00 = self.vertex_at_time(x, y, q.ia, q.ib, q.alpha);
                let v10 = self.vertex_at_time(x + 1, y, q.ia, q.ib, q.alpha);
                let v01 = self.vertex_at_time(x, y + 1, q.ia, q.ib, q.alpha);
                let v11 = self.vertex_at_time(x + 1, y + 1, q.ia, q.ib, q.alpha);

                if intersect_triangle(ray, v00.p, v10.p, v11.p, v00.n, intersection) {
                    hit_any = true;
                }
                if intersect_triangle(ray, v00.p, v11.p, v01.p, v00.n, intersection) {
                    hit_any = true;
                }

                if ray.is_shadow_ray && hit_any {
                    return true;
                }
            }
        }

        hit_any
    }
}

/// Moller-Trumbore ray/triangle intersection, updating `intersection` only
/// if this hit is closer than whatever it already holds.
#[allow(clippy::too_many_arguments)]
fn intersect_triangle(
    ray: &Ray,
    a: Point,
    b: Point,
    c: Point,
    fallback_n: Vec3,
    intersection: &mut Intersection,
) -> bool {
    use cgmath::{EuclideanSpace as _, InnerSpace as _};

    const EPS: FreeCoordinate = 1e-12;
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = ray.d.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < EPS {
        return false;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.o - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let qvec = tvec.cross(edge1);
    let v = ray.d.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    let t = edge2.dot(qvec) * inv_det;

    if t >= ray.max_t || t < crate::math::T_EPSILON {
        return false;
    }
    if t > intersection.t {
        return false;
    }

    let mut n = edge1.cross(edge2);
    if n.magnitude2() < 1e-18 {
        n = fallback_n;
    } else {
        n = n.normalize();
    }
    let backfacing = n.dot(ray.d) > 0.0;

    intersection.hit = true;
    intersection.t = t;
    intersection.p = ray.o + ray.d * t;
    intersection.n = n;
    intersection.incoming = ray.d;
    intersection.offset = n * 1e-4;
    intersection.backfacing = backfacing;
    intersection.ow = ray.ow + ray.dw * t;
    intersection.dw = ray.dw;
    intersection.color = crate::color::Rgb::new(
        ((n.x + 1.0) / 2.0) as f32,
        ((n.y + 1.0) / 2.0) as f32,
        ((n.z + 1.0) / 2.0) as f32,
    );
    true
}
