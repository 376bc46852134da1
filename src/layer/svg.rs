//! SVG and tiny-skia rendering utilities.
//!
//! Vector artwork (raw markup or Twemoji presets) is rasterized with resvg,
//! and the backing shape is drawn with the tiny-skia rasterizer resvg
//! re-exports. Both paths come back through [`pixmap_to_bitmap`].

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use super::center::MAX_CANVAS_SIDE;
use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;

// ============================================================================
// SvgSource
// ============================================================================

/// Vector artwork for [`ImageSource::Svg`](crate::ImageSource::Svg).
///
/// ```
/// use flat_icon_renderer::SvgSource;
///
/// let raw = SvgSource::from_svg("<svg>...</svg>");
/// assert_eq!(raw.resolve(), Some("<svg>...</svg>"));
///
/// // Preset library artwork (requires `twemoji` feature)
/// #[cfg(feature = "twemoji")]
/// let duck = SvgSource::from_emoji("🦆").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgSource {
    /// Markup supplied by the caller.
    Raw(String),

    /// A preset from the bundled icon library, keyed by emoji. Resolves only
    /// with the `twemoji` feature.
    Emoji(String),
}

impl SvgSource {
    pub fn from_svg(svg: impl Into<String>) -> Self {
        Self::Raw(svg.into())
    }

    /// Looks up a library preset. `None` if no artwork exists for `emoji`.
    #[cfg(feature = "twemoji")]
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        use twemoji_assets::svg::SvgTwemojiAsset;

        SvgTwemojiAsset::from_emoji(emoji)?;
        Some(Self::Emoji(emoji.to_string()))
    }

    /// The SVG markup to rasterize, if the source can be resolved.
    pub fn resolve(&self) -> Option<&str> {
        match self {
            Self::Raw(svg) => Some(svg.as_str()),
            #[cfg(feature = "twemoji")]
            Self::Emoji(emoji) => {
                use twemoji_assets::svg::SvgTwemojiAsset;
                let asset = SvgTwemojiAsset::from_emoji(emoji)?;
                Some(asset.as_ref())
            }
            #[cfg(not(feature = "twemoji"))]
            Self::Emoji(_) => None,
        }
    }
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders SVG markup so its larger side is `size` pixels, preserving aspect ratio.
pub fn render_svg(svg_data: &str, size: u32) -> Result<Bitmap> {
    if size == 0 || size > MAX_CANVAS_SIDE {
        return Err(FlatIconError::invalid(
            "size",
            format!("SVG raster size must be within 1..={}, got {}", MAX_CANVAS_SIDE, size),
        ));
    }

    let opts = Options::default();
    let tree = Tree::from_str(svg_data, &opts)
        .map_err(|e| FlatIconError::DecodeFailure(format!("invalid SVG: {}", e)))?;

    let svg_size = tree.size();
    let scale = (size as f32) / svg_size.width().max(svg_size.height());
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| FlatIconError::DecodeFailure(format!("SVG rasterizes to {}x{}", width, height)))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap_to_bitmap(&pixmap)
}

/// Renders an [`SvgSource`], resolving emoji presets first.
pub fn render_source(source: &SvgSource, size: u32) -> Result<Bitmap> {
    let svg_data = source.resolve().ok_or_else(|| {
        FlatIconError::DecodeFailure(format!("SVG source {:?} cannot be resolved", source))
    })?;
    render_svg(svg_data, size)
}

/// Converts a premultiplied tiny-skia pixmap into a straight-alpha bitmap.
pub(crate) fn pixmap_to_bitmap(pixmap: &Pixmap) -> Result<Bitmap> {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut img = RgbaImage::new(width, height);

    for (x, y, out) in img.enumerate_pixels_mut() {
        if let Some(pixel) = pixmap.pixel(x, y) {
            let (r, g, b, a) =
                unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha());
            *out = Rgba([r, g, b, a]);
        }
    }

    Bitmap::from_image(img)
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Alpha blends two straight-alpha RGBA pixels (source over destination).
pub(crate) fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================
