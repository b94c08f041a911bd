//! Instancing wrappers that move an object without copying its geometry.
//!
//! Rays are carried into object space, intersected there, and the hit is
//! mapped back. Light sampling is forwarded the same way, so a translated or
//! rotated light stays samplable.

use crate::{HitRecord, Hittable};
use rand::RngCore;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Mat3, Ray, Vec3};

/// An object displaced by a fixed offset.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
    bbox: Aabb,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        let bbox = object.bounding_box().translate(offset);
        Self {
            object,
            offset,
            bbox,
        }
    }
}

impl Hittable for Translate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let offset_ray = Ray::new(ray.origin() - self.offset, ray.direction(), ray.time());

        let mut rec = self.object.hit(&offset_ray, ray_t)?;
        rec.p += self.offset;
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object.pdf_value(origin - self.offset, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin - self.offset, rng)
    }
}

/// An object rotated about the world Y axis.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    /// Object space to world space
    to_world: Mat3,
    /// World space to object space
    to_object: Mat3,
    bbox: Aabb,
}

impl RotateY {
    /// Rotate by `degrees`, counter-clockwise looking down -Y.
    pub fn new(object: Arc<dyn Hittable>, degrees: f32) -> Self {
        let to_world = Mat3::from_rotation_y(degrees.to_radians());
        let to_object = to_world.transpose();

        // Bound the eight rotated corners
        let (min, max) = object
            .bounding_box()
            .corners()
            .iter()
            .map(|&corner| to_world * corner)
            .fold(
                (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
                |(min, max), p| (min.min(p), max.max(p)),
            );

        Self {
            object,
            to_world,
            to_object,
            bbox: Aabb::from_points(min, max),
        }
    }
}

impl Hittable for RotateY {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let rotated = Ray::new(
            self.to_object * ray.origin(),
            self.to_object * ray.direction(),
            ray.time(),
        );

        // Rotation preserves the facing test, so front_face carries over
        let mut rec = self.object.hit(&rotated, ray_t)?;
        rec.p = self.to_world * rec.p;
        rec.normal = self.to_world * rec.normal;
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object
            .pdf_value(self.to_object * origin, self.to_object * direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.to_world * self.object.random(self.to_object * origin, rng)
    }
}
