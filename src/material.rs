//! Surface materials and their shading palettes.
//!
//! The CPU rasterizers never evaluate a lighting equation per pixel. Instead
//! each material owns a 256-entry **palette** mapping a quantized
//! normal-facing value (`nz * 255`, where `nz` is the z component of the
//! rotated unit normal) to a final RGB color:
//!
//! ```text
//!   index:   0 ............................. 203 ......... 255
//!   color:   ambient  ──ramp to diffuse──►  diffuse ──► white   (specular tail)
//! ```
//!
//! The palette is generated lazily on first use and cached for the lifetime of
//! the material.

use std::sync::OnceLock;

use crate::colors::{self, ambient_from_diffuse, channels};

/// Number of palette entries, one per quantized shade value.
pub const PALETTE_SIZE: usize = 256;

/// First palette index of the simulated specular highlight.
const SPECULAR_START: u32 = 204;

/// Shading parameters consumed by the rasterizers.
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    ambient_color: u32,
    diffuse_color: u32,
    specular_color: u32,
    ambient_reflection: f32,
    diffuse_reflection: f32,
    specular_reflection: f32,
    shininess: f32,
    transparency: f32,
    environment_cast: bool,
    lighting_cast: bool,
    palette: OnceLock<Box<[u32; PALETTE_SIZE]>>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("", colors::DEFAULT_DIFFUSE)
    }
}

impl Material {
    /// Creates a material with the given diffuse color. The ambient color
    /// defaults to an eighth of the diffuse intensity.
    pub fn new(name: impl Into<String>, diffuse_color: u32) -> Self {
        let diffuse_color = diffuse_color & 0x00ff_ffff;
        Self {
            name: name.into(),
            ambient_color: ambient_from_diffuse(diffuse_color),
            diffuse_color,
            specular_color: diffuse_color,
            ambient_reflection: 0.2,
            diffuse_reflection: 1.0,
            specular_reflection: 0.0,
            shininess: 1.0,
            transparency: 0.0,
            environment_cast: false,
            lighting_cast: true,
            palette: OnceLock::new(),
        }
    }

    /// The material used for meshes that do not carry their own.
    pub fn default_for(model_color: u32) -> Self {
        Self::new("default", model_color)
    }

    // ============ Builders ============
    // Every builder invalidates the cached palette.

    pub fn with_ambient(mut self, color: u32) -> Self {
        self.ambient_color = color & 0x00ff_ffff;
        self.palette = OnceLock::new();
        self
    }

    pub fn with_specular(mut self, color: u32, reflection: f32) -> Self {
        self.specular_color = color & 0x00ff_ffff;
        self.specular_reflection = reflection.clamp(0.0, 1.0);
        self.palette = OnceLock::new();
        self
    }

    pub fn with_reflection(mut self, ambient: f32, diffuse: f32) -> Self {
        self.ambient_reflection = ambient.clamp(0.0, 1.0);
        self.diffuse_reflection = diffuse.clamp(0.0, 1.0);
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess.clamp(1.0, 128.0);
        self
    }

    /// Sets transparency, clamped to `0.0` (opaque) ..= `1.0` (invisible).
    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = if transparency.is_nan() {
            0.0
        } else {
            transparency.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_environment_cast(mut self, cast: bool) -> Self {
        self.environment_cast = cast;
        self
    }

    pub fn with_lighting_cast(mut self, cast: bool) -> Self {
        self.lighting_cast = cast;
        self
    }

    // ============ Accessors ============

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ambient_color(&self) -> u32 {
        self.ambient_color
    }

    pub fn diffuse_color(&self) -> u32 {
        self.diffuse_color
    }

    pub fn specular_color(&self) -> u32 {
        self.specular_color
    }

    pub fn ambient_reflection(&self) -> f32 {
        self.ambient_reflection
    }

    pub fn diffuse_reflection(&self) -> f32 {
        self.diffuse_reflection
    }

    pub fn specular_reflection(&self) -> f32 {
        self.specular_reflection
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn transparency(&self) -> f32 {
        self.transparency
    }

    pub fn is_environment_cast(&self) -> bool {
        self.environment_cast
    }

    pub fn is_lighting_cast(&self) -> bool {
        self.lighting_cast
    }

    /// A specular highlight tail is baked into the palette when the material
    /// has any specular reflection.
    pub fn simulate_specular(&self) -> bool {
        self.specular_reflection > 0.0
    }

    /// Returns the shading palette, generating it on first use.
    pub fn palette(&self) -> &[u32; PALETTE_SIZE] {
        self.palette.get_or_init(|| Box::new(self.generate_palette()))
    }

    /// Palette entry for a facing value in `0.0..=1.0`.
    #[inline]
    pub fn shade(&self, nz: f32) -> u32 {
        self.palette()[palette_index(nz * 255.0)]
    }

    fn generate_palette(&self) -> [u32; PALETTE_SIZE] {
        let (ar, ag, ab) = channels(self.ambient_color);
        let ambient = [ar as f32, ag as f32, ab as f32];
        let (dr, dg, db) = channels(self.diffuse_color);
        let diffuse = [dr as f32, dg as f32, db as f32];

        let mut palette = [0u32; PALETTE_SIZE];
        for (i, entry) in palette.iter_mut().enumerate() {
            let i = i as u32;
            let fi = i as f32;
            let mut rgb = [0.0f32; 3];
            for c in 0..3 {
                rgb[c] = if self.simulate_specular() {
                    if i < SPECULAR_START {
                        ambient[c].max(fi * diffuse[c] / SPECULAR_START as f32)
                    } else {
                        let tail = (i - SPECULAR_START) as f32;
                        ambient[c].max(diffuse[c] + tail * (255.0 - diffuse[c]) / 82.0)
                    }
                } else {
                    // Soft gaussian lift around the dark end of the ramp.
                    let x = fi / 256.0;
                    let lift = 1.0 + (-(x * 2.0).powi(2)).exp();
                    ambient[c].max(fi * diffuse[c] / 256.0) * lift
                };
            }
            *entry = pack_channel(rgb[0]) << 16 | pack_channel(rgb[1]) << 8 | pack_channel(rgb[2]);
        }
        palette
    }
}

/// Truncates an interpolated shade value into a valid palette index.
#[inline]
pub(crate) fn palette_index(value: f32) -> usize {
    if value > 0.0 {
        (value as usize).min(PALETTE_SIZE - 1)
    } else {
        0
    }
}

#[inline]
fn pack_channel(v: f32) -> u32 {
    v.clamp(0.0, 255.0) as u32
}
