//! Material trait for surface scattering.

use crate::pdf::{CosinePdf, MaterialPdf, SpherePdf};
use crate::sampling::{gen_f32, random_unit_vector};
use crate::texture::{SolidColor, Texture};
use crate::HitRecord;
use rand::RngCore;
use std::f32::consts::PI;
use std::sync::Arc;
use umbra_math::{Color, Ray, Vec3};

/// How a scattered ray should be continued.
#[derive(Debug, Clone, Copy)]
pub enum ScatterKind {
    /// Perfectly (or nearly) specular: follow this ray, no PDF weighting.
    SkipPdf(Ray),
    /// Sample a direction from this density, mixed with light sampling.
    Pdf(MaterialPdf),
}

/// Result of a successful scatter.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRecord {
    pub attenuation: Color,
    pub kind: ScatterKind,
}

impl ScatterRecord {
    pub fn specular(attenuation: Color, ray: Ray) -> Self {
        Self {
            attenuation,
            kind: ScatterKind::SkipPdf(ray),
        }
    }

    pub fn sampled(attenuation: Color, pdf: MaterialPdf) -> Self {
        Self {
            attenuation,
            kind: ScatterKind::Pdf(pdf),
        }
    }

    /// True when the integrator should bypass importance sampling.
    pub fn skip_pdf(&self) -> bool {
        matches!(self.kind, ScatterKind::SkipPdf(_))
    }
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterRecord>;

    /// Density with which this material scatters `ray_in` into `scattered`.
    ///
    /// Must agree with the PDF returned from `scatter` for the estimator to
    /// stay unbiased.
    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
        0.0
    }

    /// Light emitted at the hit point. Most materials return black.
    fn emitted(&self, _ray_in: &Ray, _rec: &HitRecord) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material.
#[derive(Clone)]
pub struct Lambertian {
    texture: Arc<dyn Texture>,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self::with_texture(Arc::new(SolidColor::new(albedo)))
    }

    pub fn with_texture(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterRecord> {
        let attenuation = self.texture.value(rec.u, rec.v, rec.p);
        Some(ScatterRecord::sampled(
            attenuation,
            MaterialPdf::Cosine(CosinePdf::new(rec.normal)),
        ))
    }

    fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f32 {
        let direction = scattered.direction();
        let len = direction.length();
        if len <= 0.0 {
            return 0.0;
        }
        let cos_theta = rec.normal.dot(direction) / len;
        (cos_theta / PI).max(0.0)
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterRecord> {
        let reflected = reflect(ray_in.direction(), rec.normal).normalize();
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz pushed the ray below the surface: absorb it
        if scattered_dir.dot(rec.normal) <= 0.0 {
            return None;
        }

        let scattered = Ray::new(rec.p, scattered_dir, ray_in.time());
        Some(ScatterRecord::specular(self.albedo, scattered))
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterRecord> {
        let refraction_ratio = if rec.front_face { 1.0 / self.ior } else { self.ior };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        // Snell's law has no solution: total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        let scattered = Ray::new(rec.p, direction, ray_in.time());
        Some(ScatterRecord::specular(Color::ONE, scattered))
    }
}

/// Diffuse light emitter.
///
/// Emits only from its front face; hits on the back see black.
#[derive(Clone)]
pub struct DiffuseLight {
    texture: Arc<dyn Texture>,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self::with_texture(Arc::new(SolidColor::new(emit)))
    }

    pub fn with_texture(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterRecord> {
        // Lights don't scatter rays
        None
    }

    fn emitted(&self, _ray_in: &Ray, rec: &HitRecord) -> Color {
        if !rec.front_face {
            return Color::ZERO;
        }
        self.texture.value(rec.u, rec.v, rec.p)
    }
}

/// Phase function of a participating medium: scatters uniformly in all
/// directions.
#[derive(Clone)]
pub struct Isotropic {
    texture: Arc<dyn Texture>,
}

impl Isotropic {
    pub fn new(albedo: Color) -> Self {
        Self::with_texture(Arc::new(SolidColor::new(albedo)))
    }

    pub fn with_texture(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for Isotropic {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterRecord> {
        let attenuation = self.texture.value(rec.u, rec.v, rec.p);
        Some(ScatterRecord::sampled(attenuation, MaterialPdf::Sphere(SpherePdf)))
    }

    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f32 {
        1.0 / (4.0 * PI)
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with relative index `etai_over_etat`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Pdf;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hit_facing_up<'a>(material: &'a dyn Material, front_face: bool) -> HitRecord<'a> {
        let ray = if front_face {
            Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y)
        } else {
            Ray::new_simple(Vec3::new(0.0, -1.0, 0.0), Vec3::Y)
        };
        HitRecord::new(&ray, 1.0, Vec3::Y, (0.25, 0.75), material)
    }

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        assert_eq!(reflect(v, Vec3::Y), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        let refracted = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!((refracted - (-Vec3::Y)).length() < 1e-5);
    }

    #[test]
    fn test_lambertian_scatter_uses_cosine_pdf() {
        let material = Lambertian::new(Color::new(0.2, 0.4, 0.6));
        let rec = hit_facing_up(&material, true);
        let ray_in = Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let mut rng = StdRng::seed_from_u64(1);

        let srec = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        assert_eq!(srec.attenuation, Color::new(0.2, 0.4, 0.6));
        assert!(!srec.skip_pdf());

        // The material's density must match its sampling PDF
        let ScatterKind::Pdf(pdf) = srec.kind else {
            panic!("lambertian must sample through a pdf");
        };
        for _ in 0..100 {
            let dir = pdf.generate(&mut rng);
            let scattered = Ray::new_simple(rec.p, dir);
            let expected = pdf.value(dir);
            let actual = material.scattering_pdf(&ray_in, &rec, &scattered);
            assert!((expected - actual).abs() < 1e-5);
        }

        let below = Ray::new_simple(rec.p, -Vec3::Y);
        assert_eq!(material.scattering_pdf(&ray_in, &rec, &below), 0.0);
    }

    #[test]
    fn test_metal_mirror_reflection() {
        let material = Metal::new(Color::splat(0.9), 0.0);
        let ray_in = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.3);
        let rec = HitRecord::new(&ray_in, 1.0, Vec3::Y, (0.0, 0.0), &material);
        let mut rng = StdRng::seed_from_u64(2);

        let srec = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        let ScatterKind::SkipPdf(scattered) = srec.kind else {
            panic!("metal must skip pdf sampling");
        };
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((scattered.direction() - expected).length() < 1e-5);
        assert_eq!(scattered.time(), 0.3);
        assert_eq!(material.scattering_pdf(&ray_in, &rec, &scattered), 0.0);
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        let metal = Metal::new(Color::ONE, 4.0);
        assert_eq!(metal.fuzz, 1.0);
    }

    #[test]
    fn test_rough_metal_absorbs_grazing_rays() {
        // Nearly grazing incidence with maximal fuzz: some samples dip below the surface
        let material = Metal::new(Color::ONE, 1.0);
        let ray_in = Ray::new_simple(Vec3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let rec = HitRecord::new(&ray_in, 1.0, Vec3::Y, (0.0, 0.0), &material);
        let mut rng = StdRng::seed_from_u64(3);

        let absorbed = (0..1000)
            .filter(|_| material.scatter(&ray_in, &rec, &mut rng).is_none())
            .count();
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material = Dielectric::new(1.5);
        // Leaving the glass at a grazing angle (back face hit)
        let ray_in = Ray::new_simple(Vec3::new(-1.0, -0.2, 0.0), Vec3::new(1.0, 0.2, 0.0));
        let rec = HitRecord::new(&ray_in, 1.0, -Vec3::Y, (0.0, 0.0), &material);
        assert!(!rec.front_face);

        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let srec = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert_eq!(srec.attenuation, Color::ONE);
            let ScatterKind::SkipPdf(scattered) = srec.kind else {
                panic!("dielectric must skip pdf sampling");
            };
            // Always reflected back into the glass
            assert!(scattered.direction().y < 0.0);
        }
    }

    #[test]
    fn test_dielectric_mostly_refracts_at_normal_incidence() {
        let material = Dielectric::new(1.5);
        let ray_in = Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let rec = HitRecord::new(&ray_in, 1.0, Vec3::Y, (0.0, 0.0), &material);
        let mut rng = StdRng::seed_from_u64(5);

        let refracted = (0..1000)
            .filter_map(|_| material.scatter(&ray_in, &rec, &mut rng))
            .filter(|srec| match srec.kind {
                ScatterKind::SkipPdf(r) => r.direction().y < 0.0,
                ScatterKind::Pdf(_) => false,
            })
            .count();
        // Schlick gives 4% reflectance at normal incidence for ior 1.5
        assert!(refracted > 900 && refracted < 1000, "refracted = {refracted}");
    }

    #[test]
    fn test_diffuse_light_is_one_sided() {
        let light = DiffuseLight::new(Color::splat(4.0));
        let ray_in = Ray::default();
        let mut rng = StdRng::seed_from_u64(6);

        let front = hit_facing_up(&light, true);
        assert_eq!(light.emitted(&ray_in, &front), Color::splat(4.0));
        assert!(light.scatter(&ray_in, &front, &mut rng).is_none());

        let back = hit_facing_up(&light, false);
        assert!(!back.front_face);
        assert_eq!(light.emitted(&ray_in, &back), Color::ZERO);
    }

    #[test]
    fn test_isotropic_scatters_uniformly() {
        let material = Isotropic::new(Color::splat(0.5));
        let rec = hit_facing_up(&material, true);
        let ray_in = Ray::default();
        let mut rng = StdRng::seed_from_u64(7);

        let srec = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        assert!(matches!(srec.kind, ScatterKind::Pdf(MaterialPdf::Sphere(_))));
        let any = Ray::new_simple(rec.p, Vec3::new(0.3, -0.9, 0.1));
        assert!((material.scattering_pdf(&ray_in, &rec, &any) - 1.0 / (4.0 * PI)).abs() < 1e-7);
    }

    #[test]
    fn test_non_emissive_materials_are_black() {
        let material = Lambertian::new(Color::ONE);
        let rec = hit_facing_up(&material, true);
        assert_eq!(material.emitted(&Ray::default(), &rec), Color::ZERO);
    }
}
