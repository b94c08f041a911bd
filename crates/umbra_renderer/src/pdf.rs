//! Probability densities over directions, used for importance sampling.
//!
//! Every PDF can both evaluate its density for a direction and draw a
//! direction from itself. The integrator mixes a light-directed PDF with the
//! material's own PDF so either strategy can find the important paths.

use crate::sampling::{gen_f32, random_cosine_direction, random_unit_vector};
use crate::Hittable;
use rand::RngCore;
use std::f32::consts::PI;
use umbra_math::{Onb, Vec3};

/// A density over directions on the unit sphere (solid-angle measure).
pub trait Pdf {
    /// Density of sampling `direction` (need not be normalized).
    fn value(&self, direction: Vec3) -> f32;

    /// Draw a direction distributed according to this density.
    fn generate(&self, rng: &mut dyn RngCore) -> Vec3;
}

/// Uniform over the whole sphere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpherePdf;

impl Pdf for SpherePdf {
    fn value(&self, _direction: Vec3) -> f32 {
        1.0 / (4.0 * PI)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        random_unit_vector(rng)
    }
}

/// Cosine-weighted hemisphere around a surface normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    uvw: Onb,
}

impl CosinePdf {
    pub fn new(normal: Vec3) -> Self {
        Self {
            uvw: Onb::new(normal),
        }
    }
}

impl Pdf for CosinePdf {
    fn value(&self, direction: Vec3) -> f32 {
        let len = direction.length();
        if len <= 0.0 {
            return 0.0;
        }
        let cosine_theta = direction.dot(self.uvw.w()) / len;
        (cosine_theta / PI).max(0.0)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.uvw.transform(random_cosine_direction(rng))
    }
}

/// Directions from `origin` toward a (light) object.
pub struct HittablePdf<'a> {
    object: &'a dyn Hittable,
    origin: Vec3,
}

impl<'a> HittablePdf<'a> {
    pub fn new(object: &'a dyn Hittable, origin: Vec3) -> Self {
        Self { object, origin }
    }
}

impl Pdf for HittablePdf<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        self.object.pdf_value(self.origin, direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(self.origin, rng)
    }
}

/// Equal-weight mixture of two densities (balance heuristic, two strategies).
pub struct MixturePdf<'a> {
    p: [&'a dyn Pdf; 2],
}

impl<'a> MixturePdf<'a> {
    pub fn new(p0: &'a dyn Pdf, p1: &'a dyn Pdf) -> Self {
        Self { p: [p0, p1] }
    }
}

impl Pdf for MixturePdf<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        0.5 * self.p[0].value(direction) + 0.5 * self.p[1].value(direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        if gen_f32(rng) < 0.5 {
            self.p[0].generate(rng)
        } else {
            self.p[1].generate(rng)
        }
    }
}

/// The closed set of densities a material can hand back from `scatter`.
#[derive(Debug, Clone, Copy)]
pub enum MaterialPdf {
    Cosine(CosinePdf),
    Sphere(SpherePdf),
}

impl Pdf for MaterialPdf {
    fn value(&self, direction: Vec3) -> f32 {
        match self {
            MaterialPdf::Cosine(pdf) => pdf.value(direction),
            MaterialPdf::Sphere(pdf) => pdf.value(direction),
        }
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            MaterialPdf::Cosine(pdf) => pdf.generate(rng),
            MaterialPdf::Sphere(pdf) => pdf.generate(rng),
        }
    }
}
