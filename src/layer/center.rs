//! Padding and centering of the cropped foreground.

use image::RgbaImage;

use super::{DependencyVersion, LayerConfig, LayerEffect, LayerVersions, RenderContext, StageKind};
use crate::error::{FlatIconError, Result};
use crate::icon::{Bitmap, SizePx};

/// Largest canvas side, in pixels, any stage allocates.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Side of the square canvas that holds a backing shape of `diameter`.
///
/// Fails with [`FlatIconError::InvalidParameter`] unless `diameter` is positive,
/// finite and rounds up to at most [`MAX_CANVAS_SIDE`].
pub fn canvas_side(diameter: f64) -> Result<u32> {
    if !diameter.is_finite() || diameter <= 0.0 {
        return Err(FlatIconError::invalid(
            "diameter",
            format!("must be a positive finite number, got {}", diameter),
        ));
    }

    let side = diameter.ceil();
    if side > MAX_CANVAS_SIDE as f64 {
        return Err(FlatIconError::invalid(
            "diameter",
            format!("a {}px canvas exceeds the {}px limit", side, MAX_CANVAS_SIDE),
        ));
    }
    Ok(side as u32)
}

/// Places `bitmap` centered on a transparent canvas of the target size.
///
/// The offset is `(target - size) / 2` per axis, rounded toward negative
/// infinity. With an odd difference the extra pixel of margin always lands on
/// the right/bottom side, so re-renders are bit-identical. Pixels that fall
/// outside the canvas are dropped.
pub fn center(bitmap: &Bitmap, target_width: u32, target_height: u32) -> Result<Bitmap> {
    if target_width == 0 || target_height == 0 {
        return Err(FlatIconError::invalid(
            "target",
            format!("canvas {}x{} has no area", target_width, target_height),
        ));
    }
    if target_width > MAX_CANVAS_SIDE || target_height > MAX_CANVAS_SIDE {
        return Err(FlatIconError::invalid(
            "target",
            format!(
                "canvas {}x{} exceeds the {}px limit",
                target_width, target_height, MAX_CANVAS_SIDE
            ),
        ));
    }

    let (x, y) = center_offset(bitmap.dimensions(), SizePx::new(target_width, target_height));
    let mut canvas = RgbaImage::new(target_width, target_height);
    image::imageops::replace(&mut canvas, bitmap.as_image(), x, y);
    Bitmap::from_image(canvas)
}

/// Offset at which an `inner` box sits centered inside `outer`.
pub fn center_offset(inner: SizePx, outer: SizePx) -> (i64, i64) {
    let axis = |inner: u32, outer: u32| (outer as i64 - inner as i64).div_euclid(2);
    (axis(inner.width, outer.width), axis(inner.height, outer.height))
}

/// Diameter of the circle enclosing a `width` x `height` box: its diagonal.
pub fn diameter_for_dimensions(width: f64, height: f64) -> f64 {
    (width * width + height * height).sqrt()
}

// ============================================================================
// PaddingConfig
// ============================================================================

/// Configuration for the padding layer.
///
/// `padding` is the fraction of the foreground size added as margin before
/// the backing shape is sized. Changing it re-runs every stage after cropping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaddingConfig {
    pub padding: f64,
}

impl PaddingConfig {
    /// Creates a padding config, rejecting negative or non-finite values.
    pub fn new(padding: f64) -> Result<Self> {
        if !padding.is_finite() || padding < 0.0 {
            return Err(FlatIconError::invalid(
                "padding",
                format!("must be a finite fraction >= 0, got {}", padding),
            ));
        }
        Ok(Self { padding })
    }

    /// The backing shape diameter for a cropped foreground of `size`.
    pub fn diameter_for(&self, size: SizePx) -> f64 {
        let width = size.width as f64 * (1.0 + self.padding);
        let height = size.height as f64 * (1.0 + self.padding);
        diameter_for_dimensions(width, height)
    }
}

impl LayerConfig for PaddingConfig {
    fn differs_from(&self, other: &Self) -> bool {
        (self.padding - other.padding).abs() > 0.0001
    }
}

impl LayerEffect for PaddingConfig {
    const KIND: StageKind = StageKind::Padding;

    /// Padding sits directly on the cropped source.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::from_version(versions.source)
    }

    fn transform(&self, ctx: &RenderContext) -> Result<Bitmap> {
        let side = canvas_side(ctx.diameter)?;
        center(ctx.cropped, side, side)
    }
}
