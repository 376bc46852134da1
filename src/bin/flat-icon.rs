use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flat_icon_renderer::{
    BackgroundColor, Configurable, IconPipeline, IconProfile, ImageSource, Shape, SvgSource,
};

#[derive(Parser)]
#[command(
    name = "flat-icon",
    about = "Render an image as a flat app icon with a long shadow"
)]
struct Cli {
    /// Source image (PNG, JPEG, ... or SVG)
    input: PathBuf,

    /// Where to write the PNG icon
    #[arg(short, long)]
    output: PathBuf,

    /// JSON profile to start from; flags below override it
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Backing shape color: hex, CSS name or hsl(h, s%, l%)
    #[arg(long)]
    color: Option<BackgroundColor>,

    #[arg(long, value_enum)]
    shape: Option<Shape>,

    /// Margin as a fraction of the artwork size
    #[arg(long)]
    padding: Option<f64>,

    /// Shadow direction in degrees (45 = down-right)
    #[arg(long)]
    angle: Option<f64>,

    /// Shadow length as a multiple of half the icon size
    #[arg(long)]
    length: Option<f64>,

    /// Shadow opacity, 0 to 1
    #[arg(long)]
    opacity: Option<f64>,

    /// Rescale the finished icon to this many pixels
    #[arg(long)]
    size: Option<u32>,

    /// Raster size for SVG input
    #[arg(long, default_value_t = 512)]
    svg_size: u32,
}

impl Cli {
    fn profile(&self) -> Result<IconProfile> {
        let mut profile = match &self.profile {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading profile {}", path.display()))?;
                IconProfile::from_json(&json)?
            }
            None => IconProfile::default(),
        };

        if let Some(color) = self.color {
            profile.background_color = color;
        }
        if let Some(shape) = self.shape {
            profile.shape = shape;
        }
        if let Some(padding) = self.padding {
            profile.padding = padding;
        }
        if let Some(angle) = self.angle {
            profile.shadow_angle_degrees = angle;
        }
        if let Some(length) = self.length {
            profile.shadow_length_factor = length;
        }
        if let Some(opacity) = self.opacity {
            profile.shadow_opacity = opacity;
        }
        Ok(profile)
    }

    fn source(&self) -> Result<ImageSource> {
        let is_svg = self
            .input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        if is_svg {
            let svg = fs::read_to_string(&self.input)
                .with_context(|| format!("reading {}", self.input.display()))?;
            Ok(ImageSource::Svg {
                source: SvgSource::from_svg(svg),
                size: self.svg_size,
            })
        } else {
            let bytes =
                fs::read(&self.input).with_context(|| format!("reading {}", self.input.display()))?;
            Ok(ImageSource::Encoded(bytes))
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut pipeline = IconPipeline::new();
    pipeline.apply_profile(&cli.profile()?)?;

    let icon = pipeline
        .load(cli.source()?)
        .with_context(|| format!("rendering {}", cli.input.display()))?;

    let png = match cli.size {
        Some(size) => icon.preview(size)?.encode_png()?,
        None => icon.encode_png()?,
    };

    fs::write(&cli.output, png).with_context(|| format!("writing {}", cli.output.display()))?;
    log::info!("wrote {}", cli.output.display());
    Ok(())
}
