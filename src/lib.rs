//! flat-icon-renderer: flat app icon compositing
//!
//! This crate turns an arbitrary image into a "flat" app icon: transparent
//! margins are trimmed, the artwork is centered on a colored circle or square,
//! a directional long shadow is cast, and everything is merged into one square
//! RGBA bitmap.
//!
//! # Example
//!
//! ```
//! use flat_icon_renderer::{BackgroundColor, Bitmap, IconPipeline, ImageSource, Shape};
//! use image::Rgba;
//!
//! let source = Bitmap::filled(100, 100, Rgba([255, 0, 0, 255]))?;
//!
//! let mut pipeline = IconPipeline::new();
//! pipeline.set_backdrop(Shape::Circle, "blue".parse::<BackgroundColor>()?);
//! pipeline.set_shadow(45.0, 1.0, 0.0)?;
//!
//! let icon = pipeline.load(ImageSource::Encoded(source.encode_png()?))?;
//! assert_eq!(icon.width(), 142);
//! assert_eq!(icon.pixel(71, 71), Rgba([255, 0, 0, 255]));
//!
//! let png = icon.encode_png()?;
//! # assert!(!png.is_empty());
//! # Ok::<(), flat_icon_renderer::FlatIconError>(())
//! ```
//!
//! # Serializable Profiles
//!
//! Settings can be saved and restored with [`IconProfile`] through the
//! [`Configurable`] trait:
//!
//! ```
//! use flat_icon_renderer::{Configurable, IconPipeline, IconProfile};
//!
//! let mut pipeline = IconPipeline::new();
//! let profile = IconProfile::from_json(r#"{"shape": "square", "shadowOpacity": 0.5}"#)?;
//! pipeline.apply_profile(&profile)?;
//!
//! let json = pipeline.export_profile().to_json()?;
//! # assert!(json.contains("\"square\""));
//! # Ok::<(), flat_icon_renderer::FlatIconError>(())
//! ```

mod color;
mod error;
mod icon;
pub mod layer;
mod pipeline;
mod profile;
mod source;

pub use color::BackgroundColor;
pub use error::{FlatIconError, Result};
pub use icon::{Bitmap, RectPx, SizePx};
pub use layer::{
    BackdropConfig, Layer, LayerConfig, LayerPipeline, MAX_CANVAS_SIDE, PaddingConfig,
    RenderReport, ShadowConfig, Shape, StageKind, SvgSource, cast_shadow, center, crop, merge,
    rasterize,
};
pub use pipeline::{Configurable, IconParameters, IconPipeline, LoadOutcome, PipelineStatus};
pub use profile::IconProfile;
pub use source::{DecodedImage, ImageSource, LoadToken, PendingLoad, parse_data_uri};
