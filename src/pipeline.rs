//! Icon pipeline orchestration with staleness-guarded loading.

use crate::color::BackgroundColor;
use crate::error::{FlatIconError, Result};
use crate::icon::Bitmap;
use crate::layer::{
    BackdropConfig, LayerPipeline, PaddingConfig, RenderReport, ShadowConfig, Shape, StageKind,
    crop,
};
use crate::profile::IconProfile;
use crate::source::{DecodedImage, ImageSource, LoadToken, PendingLoad};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from an [`IconProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    ///
    /// The profile is validated as a whole first; on error nothing changes.
    fn apply_profile(&mut self, profile: &IconProfile) -> Result<()>;

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> IconProfile;
}

// ============================================================================
// IconParameters
// ============================================================================

/// Every user-facing knob of the icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconParameters {
    pub background_color: BackgroundColor,
    pub shape: Shape,
    /// Fraction of the foreground size added as margin, `>= 0`.
    pub padding: f64,
    pub shadow_angle_degrees: f64,
    /// Multiple of half the canvas size, `>= 0`.
    pub shadow_length_factor: f64,
    /// `[0, 1]`
    pub shadow_opacity: f64,
}

impl Default for IconParameters {
    fn default() -> Self {
        let shadow = ShadowConfig::default();
        Self {
            background_color: BackgroundColor::default(),
            shape: Shape::default(),
            padding: 0.0,
            shadow_angle_degrees: shadow.angle_degrees,
            shadow_length_factor: shadow.length_factor,
            shadow_opacity: shadow.opacity,
        }
    }
}

impl IconParameters {
    pub fn backdrop_config(&self) -> BackdropConfig {
        BackdropConfig::new(self.shape, self.background_color)
    }

    pub fn padding_config(&self) -> Result<PaddingConfig> {
        PaddingConfig::new(self.padding)
    }

    pub fn shadow_config(&self) -> Result<ShadowConfig> {
        ShadowConfig::new(
            self.shadow_angle_degrees,
            self.shadow_length_factor,
            self.shadow_opacity,
        )
    }

    /// Checks every numeric field, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        self.padding_config()?;
        self.shadow_config()?;
        Ok(())
    }
}

// ============================================================================
// IconPipeline
// ============================================================================

/// Where the pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// No source image has been applied yet.
    Empty,
    /// A source is loaded (or parameters changed) and awaits a render.
    Loaded,
    /// [`IconPipeline::output`] reflects the current source and parameters.
    Rendered,
}

/// Result of [`IconPipeline::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image was cropped and replaced the previous source.
    Applied,
    /// A newer load was requested in the meantime; the image was dropped.
    Superseded,
}

/// The flat icon renderer.
///
/// `IconPipeline` owns the cropped source, the per-stage caches and the last
/// successful output. Changing a parameter only re-runs the stages that depend
/// on it, see [`LayerPipeline`].
///
/// # Example
///
/// ```
/// use flat_icon_renderer::{Bitmap, IconPipeline, ImageSource, PipelineStatus};
/// use image::Rgba;
///
/// let png = Bitmap::filled(8, 8, Rgba([255, 0, 0, 255]))?.encode_png()?;
///
/// let mut pipeline = IconPipeline::new();
/// let icon = pipeline.load(ImageSource::Encoded(png))?;
/// assert_eq!(icon.width(), 12);
///
/// pipeline.set_padding(0.5)?;
/// assert_eq!(pipeline.status(), PipelineStatus::Loaded);
/// assert_eq!(pipeline.render()?.width(), 17);
/// # Ok::<(), flat_icon_renderer::FlatIconError>(())
/// ```
pub struct IconPipeline {
    layers: LayerPipeline,
    cropped: Option<Bitmap>,

    /// Generation of the applied source; feeds every cache key.
    source_generation: u64,

    /// Generation handed out by the most recent `begin_load`.
    latest_load: u64,

    crop_pending: bool,
    status: PipelineStatus,
    output: Option<Bitmap>,
    last_report: RenderReport,
}

impl Default for IconPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl IconPipeline {
    pub fn new() -> Self {
        Self {
            layers: LayerPipeline::default(),
            cropped: None,
            source_generation: 0,
            latest_load: 0,
            crop_pending: false,
            status: PipelineStatus::Empty,
            output: None,
            last_report: RenderReport::default(),
        }
    }

    /// Creates a pipeline with the given parameters.
    pub fn with_parameters(parameters: &IconParameters) -> Result<Self> {
        let mut pipeline = Self::new();
        pipeline.set_parameters(parameters)?;
        Ok(pipeline)
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// The last successfully rendered icon, if any.
    ///
    /// Survives failed renders, parameter changes and new loads until the next
    /// successful render replaces it.
    pub fn output(&self) -> Option<&Bitmap> {
        self.output.as_ref()
    }

    /// The cropped source currently in use.
    pub fn cropped_source(&self) -> Option<&Bitmap> {
        self.cropped.as_ref()
    }

    /// Stages recomputed by the most recent successful render.
    pub fn last_report(&self) -> &RenderReport {
        &self.last_report
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Starts loading a new source. Any load started earlier becomes stale.
    pub fn begin_load(&mut self, source: ImageSource) -> PendingLoad {
        self.latest_load = self.latest_load.wrapping_add(1);
        PendingLoad::new(LoadToken(self.latest_load), source)
    }

    /// Applies a decoded image if it belongs to the latest load.
    ///
    /// A stale completion is dropped and reported as
    /// [`LoadOutcome::Superseded`], even if it failed to decode. Otherwise
    /// decode and crop errors are returned and the current state is kept.
    pub fn finish_load(&mut self, decoded: DecodedImage) -> Result<LoadOutcome> {
        if decoded.token.0 != self.latest_load {
            log::warn!(
                "{}: dropped, superseded by load #{}",
                decoded.token,
                self.latest_load
            );
            return Ok(LoadOutcome::Superseded);
        }

        let cropped = crop(&decoded.result?)?;
        log::info!(
            "{}: cropped source to {}x{}",
            decoded.token,
            cropped.width(),
            cropped.height()
        );

        self.cropped = Some(cropped);
        self.source_generation = decoded.token.0;
        self.layers.invalidate_all();
        self.crop_pending = true;
        self.status = PipelineStatus::Loaded;
        Ok(LoadOutcome::Applied)
    }

    /// Loads and renders `source` synchronously.
    pub fn load(&mut self, source: ImageSource) -> Result<&Bitmap> {
        let decoded = self.begin_load(source).decode();
        self.finish_load(decoded)?;
        self.render()
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    /// The parameters currently configured.
    pub fn parameters(&self) -> IconParameters {
        let backdrop = self.layers.backdrop.config();
        let shadow = self.layers.shadow.config();
        IconParameters {
            background_color: backdrop.color,
            shape: backdrop.shape,
            padding: self.layers.padding.config().padding,
            shadow_angle_degrees: shadow.angle_degrees,
            shadow_length_factor: shadow.length_factor,
            shadow_opacity: shadow.opacity,
        }
    }

    /// Replaces every parameter. Returns true if anything changed.
    pub fn set_parameters(&mut self, parameters: &IconParameters) -> Result<bool> {
        let padding = parameters.padding_config()?;
        let shadow = parameters.shadow_config()?;

        let mut changed = self.layers.padding.set_config(padding);
        changed |= self.layers.backdrop.set_config(parameters.backdrop_config());
        changed |= self.layers.shadow.set_config(shadow);
        Ok(self.mark_changed(changed))
    }

    pub fn set_padding(&mut self, padding: f64) -> Result<bool> {
        let changed = self.layers.padding.set_config(PaddingConfig::new(padding)?);
        Ok(self.mark_changed(changed))
    }

    pub fn set_backdrop(&mut self, shape: Shape, color: BackgroundColor) -> bool {
        let changed = self
            .layers
            .backdrop
            .set_config(BackdropConfig::new(shape, color));
        self.mark_changed(changed)
    }

    pub fn set_shadow(
        &mut self,
        angle_degrees: f64,
        length_factor: f64,
        opacity: f64,
    ) -> Result<bool> {
        let config = ShadowConfig::new(angle_degrees, length_factor, opacity)?;
        let changed = self.layers.shadow.set_config(config);
        Ok(self.mark_changed(changed))
    }

    fn mark_changed(&mut self, changed: bool) -> bool {
        if changed && self.status == PipelineStatus::Rendered {
            self.status = PipelineStatus::Loaded;
        }
        changed
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Renders the current source with the current parameters.
    ///
    /// Fails with [`FlatIconError::EmptyImage`] before any source is loaded.
    /// On failure the previous output stays available through [`output`](Self::output).
    pub fn render(&mut self) -> Result<&Bitmap> {
        let cropped = self.cropped.as_ref().ok_or(FlatIconError::EmptyImage)?;

        let (bitmap, mut report) = match self.layers.render(cropped, self.source_generation) {
            Ok(rendered) => rendered,
            Err(e) => {
                log::warn!("render failed, keeping previous output: {}", e);
                return Err(e);
            }
        };

        if self.crop_pending {
            report.recomputed.insert(0, StageKind::Crop);
            self.crop_pending = false;
        }
        self.last_report = report;
        self.status = PipelineStatus::Rendered;
        let output: &Bitmap = self.output.insert(bitmap);
        Ok(output)
    }

    /// Clears every stage cache. The next render recomputes all stages.
    pub fn clear_cache(&mut self) {
        self.layers.invalidate_all();
    }
}

impl Configurable for IconPipeline {
    fn apply_profile(&mut self, profile: &IconProfile) -> Result<()> {
        self.set_parameters(&profile.to_parameters()?)?;
        Ok(())
    }

    fn export_profile(&self) -> IconProfile {
        IconProfile::from(&self.parameters())
    }
}

// ============================================================================
// Tests
// ============================================================================
