//! Planar parallelogram primitive and the axis-aligned box built from it.

use crate::bvh::BvhNode;
use crate::hittable::{HitRecord, Hittable, HittableList};
use crate::sampling::gen_f32;
use crate::Material;
use rand::RngCore;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// A parallelogram spanned by `u` and `v` from corner `q`.
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// `n / (n . n)` where `n = u x v`, for planar coordinates
    w: Vec3,
    normal: Vec3,
    d: f32,
    area: f32,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Quad {
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: Arc<dyn Material>) -> Self {
        let n = u.cross(v);
        let area = n.length();
        let normal = n.normalize_or_zero();
        let d = normal.dot(q);
        let n_dot_n = n.dot(n);
        let w = if n_dot_n > 0.0 { n / n_dot_n } else { Vec3::ZERO };

        // Both diagonals, so a degenerate u or v still yields a box
        let diag1 = Aabb::from_points(q, q + u + v);
        let diag2 = Aabb::from_points(q + u, q + v);
        let bbox = Aabb::surrounding(&diag1, &diag2);

        Self {
            q,
            u,
            v,
            w,
            normal,
            d,
            area,
            material,
            bbox,
        }
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl Hittable for Quad {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let denom = self.normal.dot(ray.direction());

        // Parallel to the plane (or a degenerate quad with no normal)
        if denom.abs() < 1e-8 {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.contains(t) {
            return None;
        }

        // Planar coordinates of the hit point must both lie in [0,1]
        let planar = ray.at(t) - self.q;
        let alpha = self.w.dot(planar.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar));
        if !Interval::UNIT.contains(alpha) || !Interval::UNIT.contains(beta) {
            return None;
        }

        Some(HitRecord::new(ray, t, self.normal, (alpha, beta), self.material.as_ref()))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new_simple(origin, direction);
        let Some(rec) = self.hit(&ray, Interval::new(0.001, f32::INFINITY)) else {
            return 0.0;
        };

        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();
        let denom = cosine * self.area;
        if denom <= 0.0 {
            return 0.0;
        }

        distance_squared / denom
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let p = self.q + gen_f32(rng) * self.u + gen_f32(rng) * self.v;
        p - origin
    }
}

/// Closed box with opposite corners `a` and `b`, built from six quads under a BVH.
pub fn make_box(a: Vec3, b: Vec3, material: Arc<dyn Material>) -> BvhNode {
    let min = a.min(b);
    let max = a.max(b);

    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    let mut sides = HittableList::new();
    // front
    sides.add(Quad::new(Vec3::new(min.x, min.y, max.z), dx, dy, material.clone()));
    // right
    sides.add(Quad::new(Vec3::new(max.x, min.y, max.z), -dz, dy, material.clone()));
    // back
    sides.add(Quad::new(Vec3::new(max.x, min.y, min.z), -dx, dy, material.clone()));
    // left
    sides.add(Quad::new(Vec3::new(min.x, min.y, min.z), dz, dy, material.clone()));
    // top
    sides.add(Quad::new(Vec3::new(min.x, max.y, max.z), dx, -dz, material.clone()));
    // bottom
    sides.add(Quad::new(Vec3::new(min.x, min.y, min.z), dx, dz, material));

    BvhNode::from_list(sides)
}
