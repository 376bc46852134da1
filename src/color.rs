//! Backing-shape color parsing.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::FlatIconError;

/// An opaque RGB color used to fill the backing shape.
///
/// Parses `#rgb` / `#rrggbb` hex, CSS color names (`"blue"`) and
/// `hsl(h, s%, l%)`. Serializes as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts an HSL triple (hue in degrees, saturation and lightness in `[0, 1]`).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hsl: Hsl = Hsl::new(hue, saturation.clamp(0.0, 1.0), lightness.clamp(0.0, 1.0));
        let rgb: Srgb = hsl.into_color();
        Self {
            r: (rgb.red * 255.0).round() as u8,
            g: (rgb.green * 255.0).round() as u8,
            b: (rgb.blue * 255.0).round() as u8,
        }
    }

    /// The fully opaque pixel for this color.
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for BackgroundColor {
    /// A teal, `hsl(168, 76%, 42%)`.
    fn default() -> Self {
        Self::from_hsl(168.0, 0.76, 0.42)
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for BackgroundColor {
    type Err = FlatIconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(FlatIconError::invalid("backgroundColor", "empty color"));
        }

        let lower = input.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("hsl(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_hsl(args);
        }

        if let Some(named) = palette::named::from_str(&lower) {
            return Ok(Self::new(named.red, named.green, named.blue));
        }

        let rgb: Srgb<u8> = input.parse().map_err(|e| {
            FlatIconError::invalid("backgroundColor", format!("`{}` is not a color: {}", input, e))
        })?;
        Ok(Self::new(rgb.red, rgb.green, rgb.blue))
    }
}

fn parse_hsl(args: &str) -> Result<BackgroundColor, FlatIconError> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let [h, s, l] = parts.as_slice() else {
        return Err(FlatIconError::invalid(
            "backgroundColor",
            "hsl() takes exactly three components",
        ));
    };

    let number = |text: &str| -> Result<f32, FlatIconError> {
        text.trim_end_matches('%')
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                FlatIconError::invalid("backgroundColor", format!("bad hsl component `{}`", text))
            })
    };

    Ok(BackgroundColor::from_hsl(
        number(h)?,
        number(s)? / 100.0,
        number(l)? / 100.0,
    ))
}

impl TryFrom<String> for BackgroundColor {
    type Error = FlatIconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackgroundColor> for String {
    fn from(color: BackgroundColor) -> Self {
        color.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#ff0000".parse::<BackgroundColor>().unwrap(), BackgroundColor::new(255, 0, 0));
        assert_eq!("00ff00".parse::<BackgroundColor>().unwrap(), BackgroundColor::new(0, 255, 0));
        assert_eq!("#00f".parse::<BackgroundColor>().unwrap(), BackgroundColor::new(0, 0, 255));
    }

    #[test]
    fn parses_named_colors() {
        assert_eq!("blue".parse::<BackgroundColor>().unwrap(), BackgroundColor::new(0, 0, 255));
        assert_eq!("Red".parse::<BackgroundColor>().unwrap(), BackgroundColor::new(255, 0, 0));
    }

    #[test]
    fn parses_hsl() {
        let color: BackgroundColor = "hsl(0, 100%, 50%)".parse().unwrap();
        assert_eq!(color, BackgroundColor::new(255, 0, 0));

        let teal: BackgroundColor = "hsl(168, 76%, 42%)".parse().unwrap();
        assert_eq!(teal, BackgroundColor::default());
        // Green dominates, then blue.
        assert!(teal.g > teal.b && teal.b > teal.r);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<BackgroundColor>().is_err());
        assert!("not-a-color".parse::<BackgroundColor>().is_err());
        assert!("hsl(1, 2)".parse::<BackgroundColor>().is_err());
        assert!("#12345".parse::<BackgroundColor>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&BackgroundColor::new(18, 52, 86)).unwrap();
        assert_eq!(json, "\"#123456\"");
        let back: BackgroundColor = serde_json::from_str("\"navy\"").unwrap();
        assert_eq!(back, BackgroundColor::new(0, 0, 128));
    }
}
