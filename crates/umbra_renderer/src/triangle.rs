//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! Per-vertex normals and texture coordinates are optional and interpolated
//! barycentrically when present.

use crate::{
    hittable::{HitRecord, Hittable},
    sampling::gen_f32,
    Material,
};
use rand::RngCore;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// A triangle primitive.
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    /// Per-vertex shading normals (unit length)
    vertex_normals: Option<[Vec3; 3]>,
    /// Per-vertex texture coordinates
    uvs: Option<[Vec2; 3]>,
    area: f32,
    material: Arc<dyn Material>,
    /// Bounding box
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<dyn Material>) -> Self {
        // Calculate edges
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let cross = edge1.cross(edge2);
        let area = cross.length() / 2.0;
        let normal = cross.normalize_or_zero();

        // Thin dimensions are padded by the AABB itself
        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);
        let bbox = Aabb::from_points(min, max);

        Self {
            v0,
            v1,
            v2,
            normal,
            vertex_normals: None,
            uvs: None,
            area,
            material,
            bbox,
        }
    }

    /// Attach per-vertex normals for smooth shading.
    pub fn with_vertex_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.vertex_normals = Some(normals.map(|n| n.normalize_or_zero()));
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    /// Shading normal at barycentric `(u, v)`, falling back to the face normal.
    fn interpolate_normal(&self, u: f32, v: f32) -> Vec3 {
        let Some([n0, n1, n2]) = self.vertex_normals else {
            return self.normal;
        };
        let w = 1.0 - u - v;
        let n = w * n0 + u * n1 + v * n2;
        n.try_normalize().unwrap_or(self.normal)
    }

    /// Texture coordinates at barycentric `(u, v)`.
    fn interpolate_uv(&self, u: f32, v: f32) -> (f32, f32) {
        let Some([t0, t1, t2]) = self.uvs else {
            return (u, v);
        };
        let w = 1.0 - u - v;
        let uv = w * t0 + u * t1 + v * t2;
        (uv.x, uv.y)
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        // Check if intersection is outside triangle (u parameter)
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        // Check if intersection is outside triangle (v parameter)
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        let normal = self.interpolate_normal(u, v);
        let uv = self.interpolate_uv(u, v);
        Some(HitRecord::new(ray, t, normal, uv, self.material.as_ref()))
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
        // Fold the unit square onto the triangle so points stay uniform
        let mut r1 = gen_f32(rng);
        let mut r2 = gen_f32(rng);
        if r1 + r2 > 1.0 {
            r1 = 1.0 - r1;
            r2 = 1.0 - r2;
        }

        let p = self.v0 + r1 * (self.v1 - self.v0) + r2 * (self.v2 - self.v0);
        p - origin
    }
}
