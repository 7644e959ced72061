//! Render configuration.
//!
//! All viewer options live in one immutable [`RenderConfig`] record. String
//! parameters (as an embedding page or a command line would supply them) are
//! parsed and validated exactly once by [`RenderConfig::from_params`]; the
//! per-frame pipeline only ever sees typed values.
//!
//! ```ignore
//! let config = RenderConfig::from_params([
//!     ("RenderMode", "texturesmooth"),
//!     ("Definition", "high"),
//!     ("BackgroundColor1", "#000000"),
//! ])?;
//! ```

use std::fmt;
use std::str::FromStr;

use crate::colors;
use crate::error::ConfigError;
use crate::light::LightingMode;

/// How meshes are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One 2x2 dot per vertex.
    Point,
    /// Polygon outlines.
    Wireframe,
    /// One palette shade per face.
    #[default]
    Flat,
    /// Palette shade interpolated from vertex normals.
    Smooth,
    /// Texture only, no shading.
    Texture,
    /// Texture modulated by the face shade.
    TextureFlat,
    /// Texture modulated by the interpolated vertex shade, or sphere mapped
    /// for environment-cast surfaces.
    TextureSmooth,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenderMode::Point => "point",
            RenderMode::Wireframe => "wireframe",
            RenderMode::Flat => "flat",
            RenderMode::Smooth => "smooth",
            RenderMode::Texture => "texture",
            RenderMode::TextureFlat => "textureflat",
            RenderMode::TextureSmooth => "texturesmooth",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" => Ok(RenderMode::Point),
            "wireframe" => Ok(RenderMode::Wireframe),
            "flat" => Ok(RenderMode::Flat),
            "smooth" => Ok(RenderMode::Smooth),
            "texture" => Ok(RenderMode::Texture),
            "textureflat" => Ok(RenderMode::TextureFlat),
            "texturesmooth" => Ok(RenderMode::TextureSmooth),
            other => Err(ConfigError::UnknownRenderMode(other.to_string())),
        }
    }
}

/// Frame buffer resolution relative to the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Definition {
    /// Half resolution, upsampled 2x2 on output.
    Low,
    /// Same resolution as the display.
    #[default]
    Standard,
    /// Double resolution, box-filtered down on output.
    High,
}

impl Definition {
    /// The definition actually used for a display of the given size. Displays
    /// with either side of 2 pixels or less always render at standard.
    pub fn effective(self, display_width: u32, display_height: u32) -> Self {
        if display_width <= 2 || display_height <= 2 {
            Definition::Standard
        } else {
            self
        }
    }

    /// Frame buffer dimensions for a display surface of the given size.
    pub fn frame_size(self, display_width: u32, display_height: u32) -> (u32, u32) {
        match self.effective(display_width, display_height) {
            Definition::Low => ((display_width + 1) / 2, (display_height + 1) / 2),
            Definition::Standard => (display_width, display_height),
            Definition::High => (display_width * 2, display_height * 2),
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Low => write!(f, "low"),
            Definition::Standard => write!(f, "standard"),
            Definition::High => write!(f, "high"),
        }
    }
}

impl FromStr for Definition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Definition::Low),
            "standard" => Ok(Definition::Standard),
            "high" => Ok(Definition::High),
            other => Err(ConfigError::UnknownDefinition(other.to_string())),
        }
    }
}

/// Immutable, validated viewer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub render_mode: RenderMode,
    pub definition: Definition,
    pub face_culling: bool,
    pub mip_mapping: bool,
    /// Crease angle applied to every mesh of a new scene, in degrees.
    pub crease_angle: Option<f32>,
    pub model_color: u32,
    pub background_top: u32,
    pub background_bottom: u32,
    pub background_on: bool,
    /// Initial rotation about X, Y and Z, in degrees.
    pub init_rotation: [f32; 3],
    /// Initial rotation about the vertical scene axis, in degrees.
    pub init_scene_rotation: f32,
    /// Scene rotation applied per tick, in degrees.
    pub auto_rotate_speed: f32,
    pub lighting_mode: LightingMode,
    pub show_lights: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::default(),
            definition: Definition::default(),
            face_culling: true,
            mip_mapping: true,
            crease_angle: None,
            model_color: colors::DEFAULT_MODEL_COLOR,
            background_top: colors::DEFAULT_BACKGROUND_TOP,
            background_bottom: colors::DEFAULT_BACKGROUND_BOTTOM,
            background_on: true,
            init_rotation: [0.0; 3],
            init_scene_rotation: 0.0,
            auto_rotate_speed: 0.0,
            lighting_mode: LightingMode::default(),
            show_lights: false,
        }
    }
}

impl RenderConfig {
    /// Parses string parameters on top of the defaults, then validates.
    ///
    /// Keys are matched case-insensitively. Recognized keys: `RenderMode`,
    /// `Definition`, `FaceCulling`, `MipMapping`, `CreaseAngle`, `ModelColor`,
    /// `BackgroundColor1`, `BackgroundColor2`, `IsBackgroundOn`, `InitRotationX`,
    /// `InitRotationY`, `InitRotationZ`, `SceneRotation`, `AutoRotateSpeed`,
    /// `Lighting`, `ShowLights`.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key.to_ascii_lowercase().as_str() {
                "rendermode" => config.render_mode = value.parse()?,
                "definition" => config.definition = value.parse()?,
                "faceculling" => config.face_culling = parse_flag(key, value)?,
                "mipmapping" => config.mip_mapping = parse_flag(key, value)?,
                "creaseangle" => {
                    let angle = parse_number(key, value)?;
                    config.crease_angle = (angle >= 0.0).then_some(angle);
                }
                "modelcolor" => config.model_color = parse_color(key, value)?,
                "backgroundcolor1" => config.background_top = parse_color(key, value)?,
                "backgroundcolor2" => config.background_bottom = parse_color(key, value)?,
                "isbackgroundon" => config.background_on = parse_flag(key, value)?,
                "initrotationx" => config.init_rotation[0] = parse_number(key, value)?,
                "initrotationy" => config.init_rotation[1] = parse_number(key, value)?,
                "initrotationz" => config.init_rotation[2] = parse_number(key, value)?,
                "scenerotation" => config.init_scene_rotation = parse_number(key, value)?,
                "autorotatespeed" => config.auto_rotate_speed = parse_number(key, value)?,
                "lighting" => config.lighting_mode = value.parse()?,
                "showlights" => config.show_lights = parse_flag(key, value)?,
                _ => return Err(ConfigError::UnknownParameter(key.to_string())),
            }
        }
        config.validate()
    }

    /// Checks numeric fields once so the pipeline can trust them.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.init_rotation.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::NonFinite("initial rotation"));
        }
        if !self.init_scene_rotation.is_finite() {
            return Err(ConfigError::NonFinite("scene rotation"));
        }
        if !self.auto_rotate_speed.is_finite() {
            return Err(ConfigError::NonFinite("auto-rotate speed"));
        }
        if self.crease_angle.is_some_and(|a| !a.is_finite()) {
            return Err(ConfigError::NonFinite("crease angle"));
        }
        Ok(self)
    }

    // ============ Fluent Overrides ============

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    pub fn with_definition(mut self, definition: Definition) -> Self {
        self.definition = definition;
        self
    }

    pub fn with_face_culling(mut self, on: bool) -> Self {
        self.face_culling = on;
        self
    }

    pub fn with_mip_mapping(mut self, on: bool) -> Self {
        self.mip_mapping = on;
        self
    }

    pub fn with_crease_angle(mut self, angle: Option<f32>) -> Self {
        self.crease_angle = angle.filter(|a| *a >= 0.0);
        self
    }

    pub fn with_background(mut self, top: u32, bottom: u32, on: bool) -> Self {
        self.background_top = top & 0x00ff_ffff;
        self.background_bottom = bottom & 0x00ff_ffff;
        self.background_on = on;
        self
    }

    pub fn with_model_color(mut self, color: u32) -> Self {
        self.model_color = color & 0x00ff_ffff;
        self
    }

    pub fn with_init_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.init_rotation = [x, y, z];
        self
    }

    pub fn with_scene_rotation(mut self, degrees: f32) -> Self {
        self.init_scene_rotation = degrees;
        self
    }

    pub fn with_auto_rotate_speed(mut self, degrees_per_tick: f32) -> Self {
        self.auto_rotate_speed = degrees_per_tick;
        self
    }

    pub fn with_lighting(mut self, mode: LightingMode, show_lights: bool) -> Self {
        self.lighting_mode = mode;
        self.show_lights = show_lights;
        self
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Accepts `#rrggbb`, `0xrrggbb` or bare `rrggbb`.
fn parse_color(key: &str, value: &str) -> Result<u32, ConfigError> {
    let hex = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if hex.is_empty() || hex.len() > 6 {
        return Err(ConfigError::InvalidColor {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    u32::from_str_radix(hex, 16).map_err(|_| ConfigError::InvalidColor {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RenderConfig::default();
        assert_eq!(config.render_mode, RenderMode::Flat);
        assert_eq!(config.definition, Definition::Standard);
        assert_eq!(config.model_color, 0xcaa618);
        assert_eq!(config.background_top, 0xffffff);
        assert_eq!(config.background_bottom, 0x383840);
        assert!(config.face_culling && config.mip_mapping && config.background_on);
    }

    #[test]
    fn parses_string_params_once() {
        let config = RenderConfig::from_params([
            ("RenderMode", "texturesmooth"),
            ("Definition", "HIGH"),
            ("BackgroundColor1", "#102030"),
            ("ModelColor", "0xff0000"),
            ("FaceCulling", "off"),
            ("CreaseAngle", "45"),
            ("InitRotationX", "-30"),
        ])
        .unwrap();
        assert_eq!(config.render_mode, RenderMode::TextureSmooth);
        assert_eq!(config.definition, Definition::High);
        assert_eq!(config.background_top, 0x102030);
        assert_eq!(config.model_color, 0xff0000);
        assert!(!config.face_culling);
        assert_eq!(config.crease_angle, Some(45.0));
        assert_eq!(config.init_rotation, [-30.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_crease_angle_disables_creasing() {
        let config = RenderConfig::from_params([("CreaseAngle", "-1")]).unwrap();
        assert_eq!(config.crease_angle, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            RenderConfig::from_params([("RenderMode", "raytrace")]),
            Err(ConfigError::UnknownRenderMode(_))
        ));
        assert!(matches!(
            RenderConfig::from_params([("ModelColor", "#12345678")]),
            Err(ConfigError::InvalidColor { .. })
        ));
        assert!(matches!(
            RenderConfig::from_params([("Bogus", "1")]),
            Err(ConfigError::UnknownParameter(_))
        ));
        assert!(matches!(
            RenderConfig::from_params([("AutoRotateSpeed", "inf")]),
            Err(ConfigError::NonFinite(_))
        ));
    }

    #[test]
    fn render_mode_round_trips_through_strings() {
        for mode in [
            RenderMode::Point,
            RenderMode::Wireframe,
            RenderMode::Flat,
            RenderMode::Smooth,
            RenderMode::Texture,
            RenderMode::TextureFlat,
            RenderMode::TextureSmooth,
        ] {
            assert_eq!(mode.to_string().parse::<RenderMode>(), Ok(mode));
        }
    }

    #[test]
    fn frame_size_follows_definition() {
        assert_eq!(Definition::Low.frame_size(101, 50), (51, 25));
        assert_eq!(Definition::Standard.frame_size(101, 50), (101, 50));
        assert_eq!(Definition::High.frame_size(101, 50), (202, 100));
        assert_eq!(Definition::High.frame_size(2, 50), (2, 50));
    }
}
