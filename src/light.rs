//! Point lights carried by a scene.
//!
//! The CPU palette shading is view-dependent only and does not consult these
//! lights. They are kept in the scene so embedding layers can read their
//! per-frame screen-space positions (see [`Light::transformed_position`]) and
//! so their marker meshes can be drawn.

use std::fmt;
use std::str::FromStr;

use crate::colors::ambient_from_diffuse;
use crate::error::ConfigError;
use crate::math::mat3x4::Mat3x4;
use crate::math::vec3::Vec3;

/// Maximum number of lights a scene accepts.
pub const MAX_LIGHTS: usize = 6;

/// A point light.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    /// Position in scene (model) space.
    pub position: Vec3,
    /// Position after the most recent frame's lighting transform.
    pub transformed_position: Vec3,
    pub ambient_color: u32,
    pub diffuse_color: u32,
    pub enabled: bool,
}

impl Light {
    /// Create a new light. The ambient color defaults to an eighth of the
    /// diffuse intensity.
    pub fn new(name: impl Into<String>, position: Vec3, diffuse_color: u32, enabled: bool) -> Self {
        Self {
            name: name.into(),
            position,
            transformed_position: Vec3::ZERO,
            ambient_color: ambient_from_diffuse(diffuse_color),
            diffuse_color,
            enabled,
        }
    }

    pub fn with_ambient(mut self, ambient_color: u32) -> Self {
        self.ambient_color = ambient_color;
        self
    }

    /// Recomputes [`Self::transformed_position`] from the scene's lighting matrix.
    pub fn update_transform(&mut self, xform: &Mat3x4) {
        self.transformed_position = xform.transform_point(self.position);
    }
}

/// How the scene is lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingMode {
    /// No lights; palette shading only.
    #[default]
    Standard,
    /// Red, green and blue key/fill/back lights.
    ThreePoint,
    /// Grey key/fill/back lights.
    Greyscale,
}

impl LightingMode {
    /// Diffuse colors for the key, fill and back lights in this mode.
    pub fn three_point_colors(&self) -> [u32; 3] {
        match self {
            LightingMode::Greyscale => [0x444444, 0x666666, 0xcbcbcb],
            _ => [0xff0000, 0x00ff00, 0x0000ff],
        }
    }

    pub fn is_lit(&self) -> bool {
        !matches!(self, LightingMode::Standard)
    }
}

impl fmt::Display for LightingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightingMode::Standard => write!(f, "standard"),
            LightingMode::ThreePoint => write!(f, "threepoint"),
            LightingMode::Greyscale => write!(f, "greyscale"),
        }
    }
}

impl FromStr for LightingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(LightingMode::Standard),
            "threepoint" | "three-point" | "3point" => Ok(LightingMode::ThreePoint),
            "greyscale" | "grayscale" => Ok(LightingMode::Greyscale),
            other => Err(ConfigError::UnknownLightingMode(other.to_string())),
        }
    }
}
