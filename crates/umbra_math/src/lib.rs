//! Umbra math - vectors, intervals, bounding boxes and rays.
//!
//! Shared by the renderer crate; everything here is a small `Copy` value type.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;

/// Linear RGB color. Components are unbounded radiance values, not 0-255.
pub type Color = Vec3;
