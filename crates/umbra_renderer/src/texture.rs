//! Textures evaluated by materials at a hit point.
//!
//! A texture maps surface coordinates `(u, v)` and the world-space hit point
//! to a linear color. Procedural textures defined outside this crate plug in
//! by implementing [`Texture`].

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use umbra_math::{Color, Interval, Vec3};

/// Errors that can occur while building an image texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Pixel buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGB image")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Trait for anything that yields a color at a surface point.
pub trait Texture: Send + Sync {
    fn value(&self, u: f32, v: f32, p: Vec3) -> Color;
}

/// A constant color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    albedo: Color,
}

impl SolidColor {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(Color::new(r, g, b))
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.albedo
    }
}

/// 3D checkerboard alternating between two textures in world space.
pub struct Checker {
    inv_scale: f32,
    even: Arc<dyn Texture>,
    odd: Arc<dyn Texture>,
}

impl Checker {
    /// `scale` is the edge length of one checker cell.
    pub fn new(scale: f32, even: Arc<dyn Texture>, odd: Arc<dyn Texture>) -> Self {
        Self {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    pub fn from_colors(scale: f32, even: Color, odd: Color) -> Self {
        Self::new(
            scale,
            Arc::new(SolidColor::new(even)),
            Arc::new(SolidColor::new(odd)),
        )
    }
}

impl Texture for Checker {
    fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        let x = (self.inv_scale * p.x).floor() as i32;
        let y = (self.inv_scale * p.y).floor() as i32;
        let z = (self.inv_scale * p.z).floor() as i32;

        if (x + y + z).rem_euclid(2) == 0 {
            self.even.value(u, v, p)
        } else {
            self.odd.value(u, v, p)
        }
    }
}

/// Nearest-neighbour lookup into an RGB image.
///
/// Pixels are stored as linear colors in `[0, 1]`, row-major, with row 0 at
/// the top of the image.
#[derive(Debug, Clone)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl ImageTexture {
    /// Shown wherever an image failed to provide any pixels.
    const MISSING: Color = Color::new(0.0, 1.0, 1.0);

    /// Load and decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        log::info!("Loaded image texture {} ({}x{})", path.display(), width, height);
        Self::from_rgb8(width, height, rgb.into_raw())
    }

    /// Build a texture from raw 8-bit RGB bytes.
    pub fn from_rgb8(width: u32, height: u32, bytes: Vec<u8>) -> TextureResult<Self> {
        let expected = width as usize * height as usize * 3;
        if bytes.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }

        let scale = 1.0 / 255.0;
        let pixels = bytes
            .chunks_exact(3)
            .map(|px| Color::new(px[0] as f32, px[1] as f32, px[2] as f32) * scale)
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f32, v: f32, _p: Vec3) -> Color {
        if self.height == 0 || self.width == 0 {
            return Self::MISSING;
        }

        // Clamp to [0,1] and flip V to image row order
        let u = Interval::UNIT.clamp(u);
        let v = 1.0 - Interval::UNIT.clamp(v);

        let i = ((u * self.width as f32) as u32).min(self.width - 1);
        let j = ((v * self.height as f32) as u32).min(self.height - 1);

        self.pixels[(j * self.width + i) as usize]
    }
}
