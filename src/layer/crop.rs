//! Trims fully transparent margins from a source image.

use crate::error::{FlatIconError, Result};
use crate::icon::{Bitmap, RectPx};

/// Finds the tight bounding box of pixels with non-zero alpha.
///
/// Returns `None` if every pixel is fully transparent.
pub fn visible_bounds(bitmap: &Bitmap) -> Option<RectPx> {
    let img = bitmap.as_image();

    let mut min_x = img.width();
    let mut min_y = img.height();
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] > 0 {
            found = true;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    found.then(|| RectPx::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Returns a new bitmap holding only the visible region of `bitmap`.
///
/// Pixels are copied exactly, alpha included. Fails with
/// [`FlatIconError::EmptyImage`] when nothing is visible.
pub fn crop(bitmap: &Bitmap) -> Result<Bitmap> {
    let bounds = visible_bounds(bitmap).ok_or(FlatIconError::EmptyImage)?;
    if bounds == bitmap.bounds() {
        return Ok(bitmap.clone());
    }

    let region = image::imageops::crop_imm(
        bitmap.as_image(),
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
    )
    .to_image();
    Bitmap::from_image(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;

    fn bitmap_with(width: u32, height: u32, visible: &[(u32, u32, u8)]) -> Bitmap {
        let mut img = RgbaImage::new(width, height);
        for &(x, y, a) in visible {
            img.put_pixel(x, y, Rgba([x as u8, y as u8, 7, a]));
        }
        Bitmap::from_image(img).unwrap()
    }

    #[test]
    fn crops_to_visible_region() {
        let bmp = bitmap_with(10, 8, &[(2, 3, 255), (6, 5, 1)]);
        let cropped = crop(&bmp).unwrap();

        assert_eq!(cropped.width(), 5);
        assert_eq!(cropped.height(), 3);
        assert_eq!(cropped.pixel(0, 0), Rgba([2, 3, 7, 255]));
        // Alpha is preserved exactly, even for barely visible pixels
        assert_eq!(cropped.pixel(4, 2), Rgba([6, 5, 7, 1]));
        assert_eq!(cropped.pixel(4, 0)[3], 0);
    }

    #[test]
    fn single_pixel_crop() {
        let bmp = bitmap_with(4, 4, &[(3, 0, 200)]);
        assert_eq!(visible_bounds(&bmp), Some(RectPx::new(3, 0, 1, 1)));
        let cropped = crop(&bmp).unwrap();
        assert_eq!(cropped.dimensions().width, 1);
        assert_eq!(cropped.pixel(0, 0)[3], 200);
    }

    #[test]
    fn fully_transparent_is_empty() {
        let bmp = Bitmap::transparent(16, 16).unwrap();
        assert_eq!(visible_bounds(&bmp), None);
        assert!(matches!(crop(&bmp), Err(FlatIconError::EmptyImage)));
    }

    #[test]
    fn already_tight_bitmap_is_unchanged() {
        let bmp = Bitmap::filled(5, 7, Rgba([1, 2, 3, 4])).unwrap();
        assert_eq!(crop(&bmp).unwrap(), bmp);
    }

    fn arb_bitmap() -> impl Strategy<Value = Bitmap> {
        (1u32..12, 1u32..12)
            .prop_flat_map(|(w, h)| {
                (
                    Just((w, h)),
                    proptest::collection::vec(prop_oneof![3 => Just(0u8), 1 => any::<u8>()], (w * h) as usize),
                )
            })
            .prop_map(|((w, h), alphas)| {
                let mut img = RgbaImage::new(w, h);
                for (i, a) in alphas.into_iter().enumerate() {
                    let i = i as u32;
                    img.put_pixel(i % w, i / w, Rgba([9, 9, 9, a]));
                }
                Bitmap::from_image(img).unwrap()
            })
    }

    proptest! {
        #[test]
        fn crop_is_idempotent(bmp in arb_bitmap()) {
            prop_assume!(visible_bounds(&bmp).is_some());
            let once = crop(&bmp).unwrap();
            let twice = crop(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn crop_edges_are_tight(bmp in arb_bitmap()) {
            prop_assume!(visible_bounds(&bmp).is_some());
            let c = crop(&bmp).unwrap();
            let (w, h) = (c.width(), c.height());
            prop_assert!((0..w).any(|x| c.pixel(x, 0)[3] > 0));
            prop_assert!((0..w).any(|x| c.pixel(x, h - 1)[3] > 0));
            prop_assert!((0..h).any(|y| c.pixel(0, y)[3] > 0));
            prop_assert!((0..h).any(|y| c.pixel(w - 1, y)[3] > 0));
        }
    }
}
