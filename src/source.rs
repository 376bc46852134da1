//! Source images and staleness-guarded loading.
//!
//! Decoding is the one step a host may run asynchronously (a worker thread, a
//! browser image decode). [`PendingLoad`] carries the generation token issued by
//! [`IconPipeline::begin_load`](crate::IconPipeline::begin_load) across that
//! boundary so the pipeline can drop completions superseded by a newer load.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};

use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;
use crate::layer::svg::{SvgSource, render_source};

/// Where a source image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded bytes in any format the `image` crate decodes (PNG, JPEG, ...).
    Encoded(Vec<u8>),

    /// A `data:image/...;base64,...` URL, as produced by a browser file reader.
    DataUri(String),

    /// Vector artwork rasterized so its larger side is `size` pixels.
    Svg { source: SvgSource, size: u32 },
}

impl ImageSource {
    /// Short description used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encoded(_) => "encoded",
            Self::DataUri(_) => "data-uri",
            Self::Svg { .. } => "svg",
        }
    }

    /// Decodes the source into a bitmap.
    pub fn decode(&self) -> Result<Bitmap> {
        match self {
            Self::Encoded(bytes) => Bitmap::decode(bytes),
            Self::DataUri(uri) => Bitmap::decode(&parse_data_uri(uri)?),
            Self::Svg { source, size } => render_source(source, *size),
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes)
    }
}

/// Extracts the payload of a base64 image data URL.
pub fn parse_data_uri(data: &str) -> Result<Vec<u8>> {
    let data = data.trim();
    if !data.starts_with("data:image/") {
        return Err(FlatIconError::DecodeFailure(
            "data URI does not carry an image".to_string(),
        ));
    }

    let payload_start = data
        .find(";base64,")
        .ok_or_else(|| FlatIconError::DecodeFailure("data URI is not base64 encoded".to_string()))?;

    general_purpose::STANDARD
        .decode(&data[payload_start + 8..])
        .map_err(|e| FlatIconError::DecodeFailure(format!("invalid base64 payload: {}", e)))
}

// ============================================================================
// Generation tokens
// ============================================================================

/// Identifies one load request. Only the most recent one may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(pub(crate) u64);

impl LoadToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load #{}", self.0)
    }
}

/// A load that has been requested but not decoded yet.
///
/// This is `Send`; hosts may move it to a worker, decode there, and hand the
/// [`DecodedImage`] back to [`IconPipeline::finish_load`](crate::IconPipeline::finish_load).
#[derive(Debug)]
pub struct PendingLoad {
    token: LoadToken,
    source: ImageSource,
}

impl PendingLoad {
    pub(crate) fn new(token: LoadToken, source: ImageSource) -> Self {
        Self { token, source }
    }

    pub fn token(&self) -> LoadToken {
        self.token
    }

    /// Decodes the source. Errors are carried inside the result so a stale
    /// failure can be discarded just like a stale success.
    pub fn decode(self) -> DecodedImage {
        let result = self.source.decode();
        match &result {
            Ok(bitmap) => log::info!(
                "{}: decoded {} source ({}x{})",
                self.token,
                self.source.kind(),
                bitmap.width(),
                bitmap.height()
            ),
            Err(e) => log::info!("{}: {} source failed to decode: {}", self.token, self.source.kind(), e),
        }
        DecodedImage {
            token: self.token,
            result,
        }
    }
}

/// The outcome of decoding a [`PendingLoad`].
#[derive(Debug)]
pub struct DecodedImage {
    pub(crate) token: LoadToken,
    pub(crate) result: Result<Bitmap>,
}

impl DecodedImage {
    pub fn token(&self) -> LoadToken {
        self.token
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes() -> Vec<u8> {
        Bitmap::filled(3, 2, Rgba([1, 2, 3, 255]))
            .unwrap()
            .encode_png()
            .unwrap()
    }

    #[test]
    fn decodes_encoded_bytes() {
        let bmp = ImageSource::Encoded(png_bytes()).decode().unwrap();
        assert_eq!(bmp.width(), 3);
        assert_eq!(bmp.pixel(0, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn decodes_data_uri() {
        let uri = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png_bytes())
        );
        let bmp = ImageSource::DataUri(uri).decode().unwrap();
        assert_eq!(bmp.height(), 2);
    }

    #[test]
    fn round_trips_bitmap_data_uri() {
        let original = Bitmap::filled(4, 4, Rgba([9, 8, 7, 6])).unwrap();
        let uri = original.to_data_uri().unwrap();
        assert_eq!(ImageSource::DataUri(uri).decode().unwrap(), original);
    }

    #[test]
    fn rejects_bad_data_uris() {
        for uri in [
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png,rawdata",
            "data:image/png;base64,!!!",
        ] {
            assert!(
                matches!(parse_data_uri(uri), Err(FlatIconError::DecodeFailure(_))),
                "{}",
                uri
            );
        }
    }

    #[test]
    fn rasterizes_svg() {
        let source = ImageSource::Svg {
            source: SvgSource::from_svg(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#000"/></svg>"##,
            ),
            size: 32,
        };
        let bmp = source.decode().unwrap();
        assert_eq!(bmp.width(), 32);
        assert_eq!(bmp.pixel(16, 16), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let decoded = PendingLoad::new(LoadToken(7), ImageSource::Encoded(vec![1, 2, 3])).decode();
        assert_eq!(decoded.token().generation(), 7);
        assert!(!decoded.is_ok());
    }
}
