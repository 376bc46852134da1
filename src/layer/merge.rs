//! Final merge of the shadowed foreground onto the backing shape.

use image::{Rgba, RgbaImage};

use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;

/// Merges `foreground` onto `background`, returning a new bitmap.
///
/// Per pixel, with `fa`/`ba` the normalized alphas:
/// - if either alpha is zero, the background pixel is kept as-is, even when
///   only the background is transparent;
/// - if both are fully opaque, the foreground pixel wins;
/// - otherwise every channel, alpha included, is `fg + (1 - fa) * bg`,
///   rounded and clamped to 255.
///
/// Fails with [`FlatIconError::SizeMismatch`] if the sizes differ.
pub fn merge(foreground: &Bitmap, background: &Bitmap) -> Result<Bitmap> {
    if foreground.dimensions() != background.dimensions() {
        return Err(FlatIconError::SizeMismatch {
            foreground: foreground.dimensions(),
            background: background.dimensions(),
        });
    }

    let mut out: RgbaImage = background.as_image().clone();
    for (fg, bg) in foreground.as_image().pixels().zip(out.pixels_mut()) {
        *bg = merge_pixel(*fg, *bg);
    }

    Bitmap::from_image(out)
}

fn merge_pixel(fg: Rgba<u8>, bg: Rgba<u8>) -> Rgba<u8> {
    if fg[3] == 0 || bg[3] == 0 {
        return bg;
    }
    if fg[3] == 255 && bg[3] == 255 {
        return fg;
    }

    let keep = 1.0 - fg[3] as f32 / 255.0;
    let channel = |i: usize| (fg[i] as f32 + keep * bg[i] as f32).round().min(255.0) as u8;
    Rgba([channel(0), channel(1), channel(2), channel(3)])
}
