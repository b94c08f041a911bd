//! Homogeneous participating medium (smoke, fog) bounded by a closed shape.

use crate::material::Isotropic;
use crate::texture::Texture;
use crate::{HitRecord, Hittable};
use rand::Rng;
use std::sync::Arc;
use umbra_math::{Aabb, Color, Interval, Ray, Vec3};

/// Constant-density volume inside `boundary`.
///
/// Free-flight distances are drawn from the thread-local generator, so
/// renders containing media are not reproducible bit-for-bit.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase_function: Isotropic,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, albedo: Color) -> Self {
        Self::with_phase(boundary, density, Isotropic::new(albedo))
    }

    pub fn with_texture(boundary: Arc<dyn Hittable>, density: f32, texture: Arc<dyn Texture>) -> Self {
        Self::with_phase(boundary, density, Isotropic::with_texture(texture))
    }

    fn with_phase(boundary: Arc<dyn Hittable>, density: f32, phase_function: Isotropic) -> Self {
        if density <= 0.0 || !density.is_finite() {
            log::warn!("Constant medium density {density} is not positive and finite; it will be invisible");
        }
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function,
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        if !(self.neg_inv_density < 0.0 && self.neg_inv_density.is_finite()) {
            return None;
        }

        // Entry and exit of the boundary along the whole line
        let entry = self.boundary.hit(ray, Interval::UNIVERSE)?;
        let exit = self
            .boundary
            .hit(ray, Interval::new(entry.t + 0.0001, f32::INFINITY))?;

        let t_enter = entry.t.max(ray_t.min);
        let t_exit = exit.t.min(ray_t.max);
        if t_enter >= t_exit {
            return None;
        }
        let t_enter = t_enter.max(0.0);

        let ray_length = ray.direction().length();
        let distance_inside = (t_exit - t_enter) * ray_length;
        let hit_distance = self.neg_inv_density * rand::thread_rng().gen::<f32>().ln();
        if hit_distance > distance_inside {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        // Normal and facing are arbitrary inside a volume
        Some(HitRecord {
            p: ray.at(t),
            normal: Vec3::X,
            material: &self.phase_function,
            u: 0.0,
            v: 0.0,
            t,
            front_face: true,
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.boundary.bounding_box()
    }
}
