//! Layer infrastructure for the icon pipeline.
//!
//! Every configurable stage is a [`Layer`] holding its configuration, a
//! version counter and a cache of its last output. Caches are stamped with the
//! combined version of the stage's upstream dependencies, so a change to one
//! parameter only re-runs the stages that actually depend on it.
//!
//! # Architecture
//!
//! Each layer config implements [`LayerEffect`], which defines:
//! - Which upstream versions its output depends on
//! - How it renders its output from the [`RenderContext`]
//!
//! Stage outputs flow through the pipeline via [`RenderContext`].

pub mod center;
pub mod crop;
pub mod merge;
pub mod shadow;
pub mod shape;
pub mod svg;

pub use center::{
    MAX_CANVAS_SIDE, PaddingConfig, canvas_side, center, center_offset, diameter_for_dimensions,
};
pub use crop::{crop, visible_bounds};
pub use merge::merge;
pub use shadow::{ShadowConfig, cast_shadow, trail_offsets};
pub use shape::{BackdropConfig, Shape, rasterize};
pub use svg::{SvgSource, render_source, render_svg};

use std::collections::HashMap;
use std::fmt;

use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;

// ============================================================================
// Stages
// ============================================================================

/// Identifies a stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Transparent margins trimmed from the source.
    Crop,
    /// Foreground centered on a canvas sized by the padded diameter.
    Padding,
    /// Backing shape rasterized at the padded diameter.
    Background,
    /// Directional shadow cast from the padded foreground.
    Shadow,
    /// Shadowed foreground merged onto the backing shape.
    Merge,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Crop => "crop",
            Self::Padding => "padding",
            Self::Background => "background",
            Self::Shadow => "shadow",
            Self::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Which stages a render actually recomputed (cache misses), in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub recomputed: Vec<StageKind>,
}

impl RenderReport {
    /// Returns true if `stage` was recomputed rather than served from cache.
    pub fn recomputed(&self, stage: StageKind) -> bool {
        self.recomputed.contains(&stage)
    }
}

// ============================================================================
// Render Context
// ============================================================================

/// Context that flows through the rendering pipeline.
///
/// Holds the cropped source, the padded diameter every size-dependent stage
/// agrees on, and the outputs of stages that have already run.
pub struct RenderContext<'a> {
    /// The cropped source image.
    pub cropped: &'a Bitmap,

    /// Diameter of the backing shape (unrounded).
    pub diameter: f64,

    outputs: HashMap<StageKind, Bitmap>,
}

impl<'a> RenderContext<'a> {
    pub fn new(cropped: &'a Bitmap, diameter: f64) -> Self {
        Self {
            cropped,
            diameter,
            outputs: HashMap::new(),
        }
    }

    /// Records the output of a stage for downstream stages.
    pub fn set_output(&mut self, stage: StageKind, bitmap: Bitmap) {
        self.outputs.insert(stage, bitmap);
    }

    /// Reads the output of an upstream stage.
    ///
    /// A missing output means the stages were applied out of order.
    pub fn output(&self, stage: StageKind) -> Result<&Bitmap> {
        self.outputs.get(&stage).ok_or_else(|| {
            FlatIconError::invalid("stage", format!("{} output requested before it was rendered", stage))
        })
    }

    /// Takes ownership of a stage output.
    pub fn take_output(&mut self, stage: StageKind) -> Result<Bitmap> {
        self.outputs.remove(&stage).ok_or_else(|| {
            FlatIconError::invalid("stage", format!("{} output requested before it was rendered", stage))
        })
    }
}

// ============================================================================
// Layer Traits
// ============================================================================

/// Trait for layer configuration types.
///
/// Implementations must detect when a configuration meaningfully differs
/// from another, which drives cache invalidation.
pub trait LayerConfig: Clone {
    /// Returns true if this config differs from another in a way that
    /// would produce different rendering output.
    fn differs_from(&self, other: &Self) -> bool;
}

/// Trait for layer configurations that know how to render their stage.
pub trait LayerEffect: LayerConfig {
    /// The stage this layer renders.
    const KIND: StageKind;

    /// Returns the dependency version for cache invalidation.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion;

    /// Renders this stage's output from the context.
    fn transform(&self, ctx: &RenderContext) -> Result<Bitmap>;
}

// ============================================================================
// Layer Dependencies
// ============================================================================

/// Represents the combined version of upstream layer dependencies.
///
/// Versions only ever increase, so the sum changes whenever any input does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependencyVersion(u64);

impl DependencyVersion {
    /// Creates a dependency version from a single version number.
    pub fn from_version(version: u64) -> Self {
        Self(version)
    }

    /// Combines multiple upstream versions into one.
    pub fn combine(versions: &[u64]) -> Self {
        Self(versions.iter().fold(0u64, |acc, v| acc.wrapping_add(*v)))
    }
}

/// Snapshot of all versions in the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerVersions {
    /// Generation of the currently applied source image.
    pub source: u64,
    /// Version of the padding layer.
    pub padding: u64,
    /// Version of the backdrop layer.
    pub backdrop: u64,
    /// Version of the shadow layer.
    pub shadow: u64,
}

// ============================================================================
// Generic Layer
// ============================================================================

/// A layer with configuration, a single-entry output cache and version tracking.
pub struct Layer<C: LayerConfig> {
    config: C,
    version: u64,
    cache: Option<(Bitmap, DependencyVersion)>,
}

impl<C: LayerConfig + Default> Default for Layer<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: LayerConfig> Layer<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            version: 0,
            cache: None,
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Returns the current version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the configuration. Returns true if it changed.
    ///
    /// Clears the cache and increments version if the config differs.
    pub fn set_config(&mut self, config: C) -> bool {
        if self.config.differs_from(&config) {
            self.config = config;
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Invalidates the cache and increments version.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.cache = None;
    }

    /// Gets the cached output if it was rendered against `deps`.
    pub fn get_cached(&self, deps: DependencyVersion) -> Option<&Bitmap> {
        self.cache
            .as_ref()
            .and_then(|(img, stored)| (*stored == deps).then_some(img))
    }

    /// Stores an output with the dependency version it was rendered against.
    pub fn store(&mut self, image: Bitmap, deps: DependencyVersion) {
        self.cache = Some((image, deps));
    }
}

impl<C: LayerEffect> Layer<C> {
    /// Renders this layer into the context, using the cache if valid.
    pub fn apply(
        &mut self,
        ctx: &mut RenderContext,
        versions: &LayerVersions,
        report: &mut RenderReport,
    ) -> Result<()> {
        let deps = C::dependencies(versions);

        if let Some(cached) = self.get_cached(deps) {
            ctx.set_output(C::KIND, cached.clone());
            return Ok(());
        }

        let output = self.config.transform(ctx)?;
        log::debug!("{}: rendered {}x{}", C::KIND, output.width(), output.height());
        report.recomputed.push(C::KIND);

        self.store(output.clone(), deps);
        ctx.set_output(C::KIND, output);
        Ok(())
    }
}

// ============================================================================
// Composite Layer
// ============================================================================

/// A cache-only layer for the merged output.
///
/// Unlike [`Layer<C>`], this has no configuration; it caches the final
/// image against the combined version of every upstream input.
#[derive(Default)]
pub struct CompositeLayer {
    cache: Option<(Bitmap, DependencyVersion)>,
}

impl CompositeLayer {
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn get_cached(&self, deps: DependencyVersion) -> Option<&Bitmap> {
        self.cache
            .as_ref()
            .and_then(|(img, stored)| (*stored == deps).then_some(img))
    }

    pub fn store(&mut self, image: Bitmap, deps: DependencyVersion) {
        self.cache = Some((image, deps));
    }
}

// ============================================================================
// Layer Pipeline
// ============================================================================

/// The stage graph below cropping.
///
/// ```text
/// Cropped source
///     │
///     ▼
/// ┌─────────┐
/// │ Padding │ ◄── Depends on: source
/// └────┬────┘
///      ├──────────────────┐
///      ▼                  ▼
/// ┌─────────┐       ┌────────────┐
/// │ Shadow  │       │ Background │ ◄── Depends on: source + padding (size)
/// └────┬────┘       └─────┬──────┘
///      └────────┬─────────┘
///               ▼
///        ┌─────────────┐
///        │    Merge    │ ◄── Depends on: everything
///        └─────────────┘
/// ```
#[derive(Default)]
pub struct LayerPipeline {
    /// Padding layer: centers the cropped source on the padded canvas.
    pub padding: Layer<PaddingConfig>,

    /// Backdrop layer: the colored backing shape.
    pub backdrop: Layer<BackdropConfig>,

    /// Shadow layer.
    pub shadow: Layer<ShadowConfig>,

    /// Merged output cache.
    pub composite: CompositeLayer,
}

impl LayerPipeline {
    /// Returns a snapshot of all layer versions for the given source generation.
    pub fn layer_versions(&self, source: u64) -> LayerVersions {
        LayerVersions {
            source,
            padding: self.padding.version(),
            backdrop: self.backdrop.version(),
            shadow: self.shadow.version(),
        }
    }

    /// Invalidates all caches.
    pub fn invalidate_all(&mut self) {
        self.padding.invalidate();
        self.backdrop.invalidate();
        self.shadow.invalidate();
        self.composite.invalidate();
    }

    fn composite_dependencies(versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::combine(&[
            versions.source,
            versions.padding,
            versions.backdrop,
            versions.shadow,
        ])
    }

    /// Renders the cropped source through every stage.
    ///
    /// `source` is the generation of the cropped image; bumping it invalidates
    /// every cached stage.
    pub fn render(&mut self, cropped: &Bitmap, source: u64) -> Result<(Bitmap, RenderReport)> {
        let versions = self.layer_versions(source);
        let composite_deps = Self::composite_dependencies(&versions);
        let mut report = RenderReport::default();

        if let Some(cached) = self.composite.get_cached(composite_deps) {
            return Ok((cached.clone(), report));
        }

        let diameter = self.padding.config().diameter_for(cropped.dimensions());
        canvas_side(diameter)?;
        let mut ctx = RenderContext::new(cropped, diameter);

        self.padding.apply(&mut ctx, &versions, &mut report)?;
        self.backdrop.apply(&mut ctx, &versions, &mut report)?;
        self.shadow.apply(&mut ctx, &versions, &mut report)?;

        let shadowed = ctx.take_output(StageKind::Shadow)?;
        let background = ctx.take_output(StageKind::Background)?;
        let merged = merge(&shadowed, &background)?;
        log::debug!("{}: rendered {}x{}", StageKind::Merge, merged.width(), merged.height());
        report.recomputed.push(StageKind::Merge);

        self.composite.store(merged.clone(), composite_deps);
        Ok((merged, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BackgroundColor;
    use image::Rgba;

    fn red_square(side: u32) -> Bitmap {
        Bitmap::filled(side, side, Rgba([255, 0, 0, 255])).unwrap()
    }

    #[test]
    fn layer_set_config_tracks_versions() {
        let mut layer: Layer<ShadowConfig> = Layer::default();
        assert_eq!(layer.version(), 0);

        assert!(layer.set_config(ShadowConfig::new(90.0, 1.0, 0.3).unwrap()));
        assert_eq!(layer.version(), 1);

        // Same config does not bump the version
        assert!(!layer.set_config(ShadowConfig::new(90.0, 1.0, 0.3).unwrap()));
        assert_eq!(layer.version(), 1);
    }

    #[test]
    fn layer_cache_respects_dependencies() {
        let mut layer: Layer<PaddingConfig> = Layer::default();
        let img = red_square(2);
        layer.store(img.clone(), DependencyVersion::from_version(3));

        assert_eq!(layer.get_cached(DependencyVersion::from_version(3)), Some(&img));
        assert!(layer.get_cached(DependencyVersion::from_version(4)).is_none());

        layer.set_config(PaddingConfig::new(0.5).unwrap());
        assert!(layer.get_cached(DependencyVersion::from_version(3)).is_none());
    }

    #[test]
    fn first_render_runs_every_stage() {
        let mut pipeline = LayerPipeline::default();
        let (out, report) = pipeline.render(&red_square(10), 1).unwrap();

        assert_eq!(out.width(), 15);
        assert_eq!(
            report.recomputed,
            vec![StageKind::Padding, StageKind::Background, StageKind::Shadow, StageKind::Merge]
        );
    }

    #[test]
    fn unchanged_render_hits_composite_cache() {
        let mut pipeline = LayerPipeline::default();
        let cropped = red_square(10);
        let (first, _) = pipeline.render(&cropped, 1).unwrap();
        let (second, report) = pipeline.render(&cropped, 1).unwrap();

        assert_eq!(first, second);
        assert!(report.recomputed.is_empty());
    }

    #[test]
    fn backdrop_change_skips_padding_and_shadow() {
        let mut pipeline = LayerPipeline::default();
        let cropped = red_square(10);
        pipeline.render(&cropped, 1).unwrap();

        pipeline
            .backdrop
            .set_config(BackdropConfig::new(Shape::Square, BackgroundColor::new(0, 0, 255)));
        let (_, report) = pipeline.render(&cropped, 1).unwrap();

        assert_eq!(report.recomputed, vec![StageKind::Background, StageKind::Merge]);
    }

    #[test]
    fn shadow_change_skips_padding_and_background() {
        let mut pipeline = LayerPipeline::default();
        let cropped = red_square(10);
        pipeline.render(&cropped, 1).unwrap();

        pipeline.shadow.set_config(ShadowConfig::new(10.0, 0.5, 0.8).unwrap());
        let (_, report) = pipeline.render(&cropped, 1).unwrap();

        assert_eq!(report.recomputed, vec![StageKind::Shadow, StageKind::Merge]);
    }

    #[test]
    fn padding_change_reruns_everything_below_crop() {
        let mut pipeline = LayerPipeline::default();
        let cropped = red_square(10);
        pipeline.render(&cropped, 1).unwrap();

        pipeline.padding.set_config(PaddingConfig::new(1.0).unwrap());
        let (out, report) = pipeline.render(&cropped, 1).unwrap();

        assert_eq!(out.width(), 29);
        assert_eq!(
            report.recomputed,
            vec![StageKind::Padding, StageKind::Background, StageKind::Shadow, StageKind::Merge]
        );
    }

    #[test]
    fn new_source_generation_invalidates_everything() {
        let mut pipeline = LayerPipeline::default();
        pipeline.render(&red_square(10), 1).unwrap();
        let (out, report) = pipeline.render(&red_square(4), 2).unwrap();

        assert_eq!(out.width(), 6);
        assert_eq!(report.recomputed.len(), 4);
    }

    #[test]
    fn oversized_canvas_is_rejected_before_any_stage() {
        let mut pipeline = LayerPipeline::default();
        pipeline.padding.set_config(PaddingConfig::new(1.0e6).unwrap());

        assert!(matches!(
            pipeline.render(&red_square(100), 1),
            Err(FlatIconError::InvalidParameter { name: "diameter", .. })
        ));
        assert!(pipeline.padding.get_cached(DependencyVersion::from_version(1)).is_none());
    }

    #[test]
    fn context_reports_missing_outputs() {
        let cropped = red_square(1);
        let ctx = RenderContext::new(&cropped, 1.5);
        assert!(ctx.output(StageKind::Padding).is_err());
    }
}
