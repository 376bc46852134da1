//! Serializable icon profile.
//!
//! An [`IconProfile`] captures every icon parameter in a JSON-friendly form so
//! settings can be saved to disk or passed between processes.
//!
//! # Example
//!
//! ```
//! use flat_icon_renderer::{IconProfile, Shape};
//!
//! let profile = IconProfile {
//!     shape: Shape::Square,
//!     shadow_opacity: 0.5,
//!     ..IconProfile::default()
//! };
//!
//! let json = profile.to_json().unwrap();
//! let restored = IconProfile::from_json(&json).unwrap();
//! assert_eq!(restored, profile);
//! ```

use serde::{Deserialize, Serialize};

use crate::color::BackgroundColor;
use crate::error::{FlatIconError, Result};
use crate::layer::Shape;
use crate::pipeline::IconParameters;

/// A serializable profile containing all icon settings.
///
/// Missing fields fall back to their defaults, so `{}` is a valid profile.
///
/// # JSON Format
///
/// ```json
/// {
///   "backgroundColor": "#1abc9c",
///   "shape": "circle",
///   "padding": 0.0,
///   "shadowAngleDegrees": 45.0,
///   "shadowLengthFactor": 1.0,
///   "shadowOpacity": 0.3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconProfile {
    /// Hex (`#rrggbb`), CSS color name or `hsl(h, s%, l%)`.
    #[cfg_attr(feature = "jsonschema", schemars(with = "String"))]
    pub background_color: BackgroundColor,

    pub shape: Shape,

    /// Fraction of the foreground size added as margin.
    pub padding: f64,

    pub shadow_angle_degrees: f64,

    /// Trail length as a multiple of half the canvas size.
    pub shadow_length_factor: f64,

    /// Weight of the shadow trail (0.0-1.0).
    pub shadow_opacity: f64,
}

impl Default for IconProfile {
    fn default() -> Self {
        Self::from(&IconParameters::default())
    }
}

impl IconProfile {
    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| FlatIconError::Encode(e.to_string()))
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| FlatIconError::Encode(e.to_string()))
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FlatIconError::invalid("profile", e.to_string()))
    }

    /// Validates the profile and converts it into pipeline parameters.
    pub fn to_parameters(&self) -> Result<IconParameters> {
        let parameters = IconParameters {
            background_color: self.background_color,
            shape: self.shape,
            padding: self.padding,
            shadow_angle_degrees: self.shadow_angle_degrees,
            shadow_length_factor: self.shadow_length_factor,
            shadow_opacity: self.shadow_opacity,
        };
        parameters.validate()?;
        Ok(parameters)
    }
}

impl From<&IconParameters> for IconProfile {
    fn from(parameters: &IconParameters) -> Self {
        Self {
            background_color: parameters.background_color,
            shape: parameters.shape,
            padding: parameters.padding,
            shadow_angle_degrees: parameters.shadow_angle_degrees,
            shadow_length_factor: parameters.shadow_length_factor,
            shadow_opacity: parameters.shadow_opacity,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
