//! Directional "long shadow" layer.
//!
//! The shadow is built from a trail of copies of the padded foreground, each
//! shifted one pixel further right and `slope` pixels further down. The trail
//! only contributes its coverage (alpha); the color of every output pixel is
//! taken from the untranslated foreground at the same coordinates, which is
//! black wherever the foreground is transparent. Finally the foreground is
//! drawn over the result so it is never dimmed by its own shadow.

use image::{Rgba, RgbaImage};

use super::svg::alpha_blend;
use super::{DependencyVersion, LayerConfig, LayerEffect, LayerVersions, RenderContext, StageKind};
use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;

// ============================================================================
// ShadowConfig
// ============================================================================

/// Configuration for the cast shadow.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowConfig {
    /// Direction of the trail in degrees, normalized to `[0, 360)`.
    /// 0° points right, 45° down-right.
    pub angle_degrees: f64,

    /// Trail length as a multiple of half the canvas size.
    pub length_factor: f64,

    /// Weight of the trail coverage added to the foreground alpha, `[0, 1]`.
    pub opacity: f64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            angle_degrees: 45.0,
            length_factor: 1.0,
            opacity: 0.3,
        }
    }
}

impl ShadowConfig {
    /// Creates a validated shadow config.
    ///
    /// The angle is normalized to the 0-360 range. Non-finite values, a
    /// negative length or an opacity outside `[0, 1]` are rejected.
    pub fn new(angle_degrees: f64, length_factor: f64, opacity: f64) -> Result<Self> {
        if !angle_degrees.is_finite() {
            return Err(FlatIconError::invalid(
                "shadowAngleDegrees",
                format!("must be finite, got {}", angle_degrees),
            ));
        }
        if !length_factor.is_finite() || length_factor < 0.0 {
            return Err(FlatIconError::invalid(
                "shadowLengthFactor",
                format!("must be a finite number >= 0, got {}", length_factor),
            ));
        }
        if !(0.0..=1.0).contains(&opacity) {
            return Err(FlatIconError::invalid(
                "shadowOpacity",
                format!("must be within [0, 1], got {}", opacity),
            ));
        }

        Ok(Self {
            angle_degrees: angle_degrees.rem_euclid(360.0),
            length_factor,
            opacity,
        })
    }

    /// Vertical advance per horizontal pixel of trail.
    pub fn slope(&self) -> f64 {
        self.angle_degrees.to_radians().tan()
    }

    /// Number of trail steps for a canvas of `image_size` pixels.
    pub fn step_count(&self, image_size: u32) -> u32 {
        ((image_size as f64 / 2.0) * self.length_factor).floor() as u32
    }
}

impl LayerConfig for ShadowConfig {
    fn differs_from(&self, other: &Self) -> bool {
        (self.angle_degrees - other.angle_degrees).abs() > 0.001
            || (self.length_factor - other.length_factor).abs() > 0.0001
            || (self.opacity - other.opacity).abs() > 0.0001
    }
}

impl LayerEffect for ShadowConfig {
    const KIND: StageKind = StageKind::Shadow;

    /// The shadow is cast from the padded foreground.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::combine(&[versions.source, versions.padding])
    }

    fn transform(&self, ctx: &RenderContext) -> Result<Bitmap> {
        cast_shadow(ctx.output(StageKind::Padding)?, self)
    }
}

// ============================================================================
// Trail geometry
// ============================================================================

/// Translations at which foreground copies are stamped, in draw order.
///
/// Step `i` runs from 1 to `steps` inclusive and stamps at `(i, slope * i)`.
/// When `|slope * i| > 1` the trail would skip rows, so it also stamps at
/// `(i, j)` for `j = (i - 1) * slope` advancing by one pixel toward
/// `slope * i` (exclusive), stopping once `|j|` reaches `limit`. Vertical
/// offsets are rounded to the nearest pixel (halves away from zero) and
/// clamped to `[-limit, limit]`.
pub fn trail_offsets(slope: f64, steps: u32, limit: u32) -> Vec<(i64, i64)> {
    let limit = limit as f64;
    let snap = |v: f64| v.round().clamp(-limit, limit) as i64;
    let direction = slope.signum();

    let mut offsets = Vec::new();
    for i in 1..=steps {
        let step = i as f64;
        let rise = slope * step;
        offsets.push((i as i64, snap(rise)));

        if rise.abs() > 1.0 {
            let mut j = (step - 1.0) * slope;
            while (rise - j) * direction > 0.0 && j.abs() < limit {
                offsets.push((i as i64, snap(j)));
                j += direction;
            }
        }
    }
    offsets
}

/// Writes the alpha of every visible source pixel, translated by `(dx, dy)`,
/// into `coverage`. Later stamps overwrite earlier ones where they are visible.
fn stamp(
    coverage: &mut [u8],
    visible: &[(u32, u32, u8)],
    width: u32,
    height: u32,
    dx: i64,
    dy: i64,
) {
    let (w, h) = (width as i64, height as i64);
    if dx >= w || dx <= -w || dy >= h || dy <= -h {
        return;
    }

    for &(x, y, alpha) in visible {
        let tx = x as i64 + dx;
        let ty = y as i64 + dy;
        if tx < 0 || ty < 0 || tx >= w || ty >= h {
            continue;
        }
        coverage[(ty * w + tx) as usize] = alpha;
    }
}

/// Casts a directional shadow from `bitmap`, returning a new bitmap of the
/// same size.
///
/// Output alpha is `source_alpha + opacity * trail_alpha` clamped to 255,
/// where the trail includes the untranslated foreground. The foreground is then
/// composited over the result unchanged.
pub fn cast_shadow(bitmap: &Bitmap, config: &ShadowConfig) -> Result<Bitmap> {
    let source = bitmap.as_image();
    let (width, height) = (bitmap.width(), bitmap.height());

    let visible: Vec<(u32, u32, u8)> = source
        .enumerate_pixels()
        .filter(|(_, _, p)| p[3] > 0)
        .map(|(x, y, p)| (x, y, p[3]))
        .collect();

    let mut coverage = vec![0u8; width as usize * height as usize];
    stamp(&mut coverage, &visible, width, height, 0, 0);

    // Copies shifted a full width or more land off the canvas.
    let steps = config.step_count(width).min(width);
    let offsets = trail_offsets(config.slope(), steps, height);
    for &(dx, dy) in &offsets {
        stamp(&mut coverage, &visible, width, height, dx, dy);
    }

    log::debug!(
        "shadow: {} stamps over {}x{} (angle {:.1}, length {}, opacity {})",
        offsets.len() + 1,
        width,
        height,
        config.angle_degrees,
        config.length_factor,
        config.opacity
    );

    let opacity = config.opacity as f32;
    let mut out = RgbaImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let original = *source.get_pixel(x, y);
        let trail_alpha = coverage[(y * width + x) as usize];

        let alpha = (original[3] as f32 + opacity * trail_alpha as f32)
            .round()
            .min(255.0) as u8;

        *pixel = if original[3] == 0 {
            Rgba([0, 0, 0, alpha])
        } else {
            let shadowed = Rgba([original[0], original[1], original[2], alpha]);
            alpha_blend(original, shadowed)
        };
    }

    Bitmap::from_image(out)
}

// ============================================================================
// Tests
// ============================================================================
