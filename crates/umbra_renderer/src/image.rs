//! Image buffer and 8-bit output encoding.
//!
//! Colors are linear radiance. Output applies gamma 2, clamps to
//! `[0, 0.99999]` and scales by 256, so 1.0 maps to 255 and never wraps.

use std::io::Write;

use umbra_math::{Color, Interval};

/// Range a gamma-corrected channel is clamped to before quantizing.
const INTENSITY: Interval = Interval::new(0.0, 0.99999);

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Quantize one linear channel to a byte. NaN maps to 0.
#[inline]
fn channel_to_byte(linear: f32) -> u8 {
    let linear = if linear.is_nan() { 0.0 } else { linear };
    (256.0 * INTENSITY.clamp(linear_to_gamma(linear))) as u8
}

/// Convert a color to 8-bit RGB.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    [
        channel_to_byte(color.x),
        channel_to_byte(color.y),
        channel_to_byte(color.z),
    ]
}

/// Write one pixel as a PPM `"r g b\n"` line.
pub fn write_color<W: Write>(out: &mut W, color: Color) -> std::io::Result<()> {
    let [r, g, b] = color_to_rgb(color);
    writeln!(out, "{} {} {}", r, g, b)
}

/// Write the plain-text (P3) PPM header.
pub fn write_ppm_header<W: Write>(out: &mut W, width: u32, height: u32) -> std::io::Result<()> {
    write!(out, "P3\n{} {}\n255\n", width, height)
}

/// Write one scanline of pixels.
pub fn write_scanline<W: Write>(out: &mut W, row: &[Color]) -> std::io::Result<()> {
    row.iter().try_for_each(|&color| write_color(out, color))
}

/// Simple image buffer for storing render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Assemble an image from rows given in top-to-bottom order.
    pub fn from_rows(width: u32, rows: Vec<Vec<Color>>) -> Self {
        let height = rows.len() as u32;
        let pixels: Vec<Color> = rows.into_iter().flatten().collect();
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// One row of pixels, top row first.
    pub fn row(&self, y: u32) -> &[Color] {
        let start = (y * self.width) as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Write the whole image as a P3 PPM, one scanline at a time.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write_ppm_header(out, self.width, self.height)?;
        for y in 0..self.height {
            write_scanline(out, self.row(y))?;
        }
        out.flush()
    }

    /// Convert to RGB bytes (for display or saving).
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&color| color_to_rgb(color)).collect()
    }

    /// Encode-ready `image` buffer, for writing PNG and friends.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.to_rgb8())
    }
}
