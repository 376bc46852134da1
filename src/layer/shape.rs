//! Backing shape rasterization.

use resvg::tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use serde::{Deserialize, Serialize};

use super::center::canvas_side;
use super::svg::pixmap_to_bitmap;
use super::{DependencyVersion, LayerConfig, LayerEffect, LayerVersions, RenderContext, StageKind};
use crate::color::BackgroundColor;
use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;

/// The outline of the backing shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Shape {
    #[default]
    Circle,
    Square,
}

/// Renders `shape` filled with `color` into a new square bitmap.
///
/// The canvas side is `diameter` rounded up, at most
/// [`MAX_CANVAS_SIDE`](super::center::MAX_CANVAS_SIDE). A circle has radius
/// `diameter / 2`, is centered on the canvas and has anti-aliased edges;
/// everything outside it is transparent. A square fills the whole canvas.
/// Output is deterministic for identical inputs.
pub fn rasterize(shape: Shape, diameter: f64, color: BackgroundColor) -> Result<Bitmap> {
    let size = canvas_side(diameter)?;

    match shape {
        Shape::Square => Bitmap::filled(size, size, color.to_rgba()),
        Shape::Circle => {
            let mut pixmap = Pixmap::new(size, size)
                .ok_or_else(|| FlatIconError::invalid("diameter", format!("{} is too large", diameter)))?;

            let center = size as f32 / 2.0;
            let path = PathBuilder::from_circle(center, center, (diameter / 2.0) as f32)
                .ok_or_else(|| FlatIconError::invalid("diameter", "circle path is degenerate"))?;

            let mut paint = Paint::default();
            paint.set_color_rgba8(color.r, color.g, color.b, 255);
            paint.anti_alias = true;

            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            pixmap_to_bitmap(&pixmap)
        }
    }
}

// ============================================================================
// BackdropConfig
// ============================================================================

/// Configuration for the backing shape layer.
///
/// Changing it only re-runs background rasterization and the final merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackdropConfig {
    pub shape: Shape,
    pub color: BackgroundColor,
}

impl BackdropConfig {
    pub fn new(shape: Shape, color: BackgroundColor) -> Self {
        Self { shape, color }
    }
}

impl LayerConfig for BackdropConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

impl LayerEffect for BackdropConfig {
    const KIND: StageKind = StageKind::Background;

    /// The backdrop size follows the padded diameter.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::combine(&[versions.source, versions.padding])
    }

    fn transform(&self, ctx: &RenderContext) -> Result<Bitmap> {
        rasterize(self.shape, ctx.diameter, self.color)
    }
}
