//! Bitmap value type shared by every pipeline stage.
//!
//! A [`Bitmap`] is a non-empty RGBA grid. Stages never mutate their inputs;
//! each one allocates and returns a fresh `Bitmap`.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::{FlatIconError, Result};
use crate::layer::MAX_CANVAS_SIDE;

/// A rectangle defined in pixel coordinates.
///
/// Used to describe the visible region of a source image found by the cropper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle starting at origin (0, 0) with the given dimensions.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An immutable, non-empty RGBA bitmap.
///
/// Channels are stored as integers in `0..=255`; alpha is also available as a
/// normalized fraction through [`Bitmap::alpha_fraction`] for blending math.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: RgbaImage,
}

impl Bitmap {
    /// Wraps an RGBA image. Fails with [`FlatIconError::EmptyImage`] if either
    /// dimension is zero.
    pub fn from_image(data: RgbaImage) -> Result<Self> {
        if data.width() == 0 || data.height() == 0 {
            return Err(FlatIconError::EmptyImage);
        }
        Ok(Self { data })
    }

    /// Builds a bitmap from a raw RGBA buffer of `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(FlatIconError::invalid(
                "pixels",
                format!("expected {} bytes for {}x{}, got {}", expected, width, height, pixels.len()),
            ));
        }
        let data = RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| FlatIconError::invalid("pixels", "buffer does not match dimensions"))?;
        Self::from_image(data)
    }

    /// Creates a fully transparent bitmap.
    pub fn transparent(width: u32, height: u32) -> Result<Self> {
        Self::from_image(RgbaImage::new(width, height))
    }

    /// Creates a bitmap filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Result<Self> {
        Self::from_image(RgbaImage::from_pixel(width, height, color))
    }

    /// Decodes any format supported by the `image` crate.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| FlatIconError::DecodeFailure(e.to_string()))?;
        Self::from_image(decoded.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Returns the pixel dimensions.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    /// Returns the rectangle covering the whole bitmap.
    pub fn bounds(&self) -> RectPx {
        RectPx::from_size(self.data.width(), self.data.height())
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.data.get_pixel(x, y)
    }

    /// Alpha at `(x, y)` as a fraction in `[0, 1]`.
    pub fn alpha_fraction(&self, x: u32, y: u32) -> f32 {
        self.data.get_pixel(x, y)[3] as f32 / 255.0
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.data
    }

    pub fn into_image(self) -> RgbaImage {
        self.data
    }

    /// Raw RGBA bytes in row-major order.
    pub fn as_raw(&self) -> &[u8] {
        self.data.as_raw()
    }

    /// Encodes the bitmap as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.data
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| FlatIconError::Encode(e.to_string()))?;
        Ok(buf)
    }

    /// Encodes the bitmap as a `data:image/png;base64,...` URL, suitable as a
    /// download link target.
    pub fn to_data_uri(&self) -> Result<String> {
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png)
        ))
    }

    /// Uniformly rescales the bitmap so its larger side equals `viewport`.
    ///
    /// Icon output is square, so this is what a preview surface shows.
    pub fn preview(&self, viewport: u32) -> Result<Bitmap> {
        if viewport == 0 || viewport > MAX_CANVAS_SIDE {
            return Err(FlatIconError::invalid(
                "viewport",
                format!("must be within 1..={} pixels, got {}", MAX_CANVAS_SIDE, viewport),
            ));
        }
        let scale = viewport as f64 / self.width().max(self.height()) as f64;
        let width = ((self.width() as f64 * scale).round() as u32).max(1);
        let height = ((self.height() as f64 * scale).round() as u32).max(1);
        if width == self.width() && height == self.height() {
            return Ok(self.clone());
        }
        Bitmap::from_image(image::imageops::resize(
            &self.data,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

impl TryFrom<RgbaImage> for Bitmap {
    type Error = FlatIconError;

    fn try_from(data: RgbaImage) -> Result<Self> {
        Self::from_image(data)
    }
}
