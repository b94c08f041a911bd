//! Umbra - CPU Path Tracing
//!
//! An offline Monte Carlo path tracer for physically-based rendering.
//! Scenes are built from spheres, quads, triangles, boxes and constant
//! density volumes, wrapped by instancing transforms and accelerated with a
//! bounding volume hierarchy. Diffuse surfaces importance-sample both their
//! own lobe and an explicit list of lights.
//!
//! Rendering is deterministic for a given seed regardless of how many worker
//! threads are used, unless the scene contains a [`ConstantMedium`].

mod bvh;
mod camera;
mod error;
mod hittable;
mod image;
mod material;
mod medium;
mod pdf;
mod progress;
mod quad;
mod renderer;
mod sampling;
mod scheduler;
mod sphere;
mod texture;
mod transform;
mod triangle;

pub use bvh::BvhNode;
pub use camera::{Camera, CameraPhase, CameraSettings};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use self::image::{
    color_to_rgb, linear_to_gamma, write_color, write_ppm_header, write_scanline, ImageBuffer,
};
pub use material::{
    reflect, refract, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal, ScatterKind,
    ScatterRecord,
};
pub use medium::ConstantMedium;
pub use pdf::{CosinePdf, HittablePdf, MaterialPdf, MixturePdf, Pdf, SpherePdf};
pub use progress::{ChannelProgress, CountingProgress, LogProgress, NoProgress, Progress};
pub use quad::{make_box, Quad};
pub use renderer::{clamp_contribution, ray_color, render, render_pixel, render_row, RenderConfig};
pub use sampling::{random_cosine_direction, random_in_unit_disk, random_unit_vector};
pub use scheduler::{render_rows, row_rng};
pub use sphere::Sphere;
pub use texture::{Checker, ImageTexture, SolidColor, Texture, TextureError, TextureResult};
pub use transform::{RotateY, Translate};
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from umbra_math
pub use umbra_math::{Aabb, Color, Interval, Ray, Vec2, Vec3};
