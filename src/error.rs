//! Error types surfaced at the crate boundary.
//!
//! Only configuration parsing and resource loading can fail. Geometry and
//! rasterization never return errors: degenerate input is absorbed by numeric
//! guards instead.

use std::fmt;

/// A render configuration that could not be parsed or validated.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownRenderMode(String),
    UnknownDefinition(String),
    UnknownLightingMode(String),
    UnknownParameter(String),
    InvalidColor { key: String, value: String },
    InvalidNumber { key: String, value: String },
    InvalidFlag { key: String, value: String },
    NonFinite(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownRenderMode(v) => write!(f, "unknown render mode '{v}'"),
            ConfigError::UnknownDefinition(v) => write!(f, "unknown definition '{v}'"),
            ConfigError::UnknownLightingMode(v) => write!(f, "unknown lighting mode '{v}'"),
            ConfigError::UnknownParameter(k) => write!(f, "unknown parameter '{k}'"),
            ConfigError::InvalidColor { key, value } => {
                write!(f, "parameter '{key}': '{value}' is not a color")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "parameter '{key}': '{value}' is not a number")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "parameter '{key}': '{value}' is not on/off")
            }
            ConfigError::NonFinite(field) => write!(f, "{field} must be finite"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A texture that could not be created.
#[derive(Debug)]
pub enum TextureError {
    /// The image data could not be opened or decoded.
    Decode(image::ImageError),
    /// Raw texels were supplied with a dimension that is not a power of two.
    NotPowerOfTwo(u32),
    /// Raw texels did not match `dimension * dimension`.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Decode(e) => write!(f, "failed to decode texture: {e}"),
            TextureError::NotPowerOfTwo(d) => {
                write!(f, "texture dimension {d} is not a power of two")
            }
            TextureError::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} texels, got {actual}")
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::Decode(e)
    }
}

/// A scene or resource load that failed.
#[derive(Debug)]
pub enum LoadError {
    /// The OBJ file could not be read or parsed.
    Obj(tobj::LoadError),
    /// The file parsed but contained no usable geometry.
    Empty(String),
    /// A texture referenced by the load could not be created.
    Texture(TextureError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Obj(e) => write!(f, "failed to load OBJ: {e}"),
            LoadError::Empty(path) => write!(f, "'{path}' contains no meshes"),
            LoadError::Texture(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Obj(e) => Some(e),
            LoadError::Texture(e) => Some(e),
            LoadError::Empty(_) => None,
        }
    }
}

impl From<tobj::LoadError> for LoadError {
    fn from(e: tobj::LoadError) -> Self {
        LoadError::Obj(e)
    }
}

impl From<TextureError> for LoadError {
    fn from(e: TextureError) -> Self {
        LoadError::Texture(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn texture_errors_chain_into_load_errors() {
        let err: LoadError = TextureError::NotPowerOfTwo(48).into();
        assert_eq!(err.to_string(), "texture dimension 48 is not a power of two");
        assert!(err.source().is_some());
    }

    #[test]
    fn config_error_messages_name_the_parameter() {
        let err = ConfigError::InvalidColor {
            key: "BackgroundColor1".into(),
            value: "#zz".into(),
        };
        assert!(err.to_string().contains("BackgroundColor1"));
    }
}
