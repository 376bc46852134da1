//! Error type shared by every pipeline stage.

use crate::icon::SizePx;

/// Errors produced while loading, rendering or exporting an icon.
///
/// A failed render never replaces the last good output held by
/// [`IconPipeline`](crate::IconPipeline); callers simply retry with new
/// parameters or a new image.
#[derive(Debug, thiserror::Error)]
pub enum FlatIconError {
    /// The source bytes could not be decoded into an image.
    #[error("failed to decode source image: {0}")]
    DecodeFailure(String),

    /// The source contains no pixel with non-zero alpha (or has no pixels at all).
    #[error("source image has no visible pixels")]
    EmptyImage,

    /// Merge operands differ in size. Indicates an orchestration bug.
    #[error(
        "layer size mismatch: foreground is {}x{}, background is {}x{}",
        foreground.width,
        foreground.height,
        background.width,
        background.height
    )]
    SizeMismatch {
        foreground: SizePx,
        background: SizePx,
    },

    /// A parameter is outside its accepted range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The rendered bitmap could not be encoded.
    #[error("failed to encode output image: {0}")]
    Encode(String),
}

impl FlatIconError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlatIconError>;
