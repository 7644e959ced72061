//! Square power-of-two textures with an optional mipmap pyramid.
//!
//! Source images of any size are resampled to the smallest square
//! power-of-two dimension in `16..=1024` that holds their larger side, so
//! texel addressing can wrap with a bit mask instead of a modulo:
//!
//! ```text
//!   texel(u, v) = data[(v & (dim - 1)) * dim + (u & (dim - 1))]
//! ```
//!
//! where `u` and `v` are already scaled to texel units.
//!
//! # Mipmaps
//!
//! Level `l` has dimension `dim >> l` and is a 2x2 box filter of level
//! `l - 1`. `mip_entries[l] = 4^l` is the minification threshold: a triangle
//! whose texel-space area is at least `4^l` times its screen-space area samples
//! level `l` or coarser.

use std::path::Path;

use image::{imageops::FilterType, RgbaImage};
use log::{debug, warn};

use crate::error::TextureError;

const MIN_DIMENSION: u32 = 16;
const MAX_DIMENSION: u32 = 1024;

/// A texture ready for sampling by the rasterizers.
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    dimension: u32,
    /// `levels[0]` is the full-resolution texel array, ARGB.
    levels: Vec<Vec<u32>>,
    mip_entries: Vec<f32>,
    has_transparency: bool,
    environment_cast: bool,
    lighting_cast: bool,
}

impl Texture {
    /// Load a texture from an image file (PNG, JPG, etc.)
    pub fn from_file<P: AsRef<Path>>(path: P, use_mipmap: bool) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| {
                warn!("texture '{}' failed to decode: {e}", path.display());
                TextureError::from(e)
            })?
            .to_rgba8();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_image(name, &img, use_mipmap))
    }

    /// Decode a texture from encoded image bytes.
    pub fn from_memory(
        name: impl Into<String>,
        bytes: &[u8],
        use_mipmap: bool,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        let img = image::load_from_memory(bytes)
            .map_err(|e| {
                warn!("texture '{name}' failed to decode: {e}");
                TextureError::from(e)
            })?
            .to_rgba8();
        Ok(Self::from_image(name, &img, use_mipmap))
    }

    /// Build a texture from a decoded image, resampling it to a square
    /// power-of-two dimension.
    pub fn from_image(name: impl Into<String>, img: &RgbaImage, use_mipmap: bool) -> Self {
        let name = name.into();
        let (width, height) = img.dimensions();
        let dim = texture_dimension(width.max(height));

        let resized;
        let source = if width == dim && height == dim {
            img
        } else {
            debug!("resampling texture '{name}' from {width}x{height} to {dim}x{dim}");
            resized = image::imageops::resize(img, dim, dim, FilterType::Triangle);
            &resized
        };

        // Convert RGBA bytes to ARGB u32
        let data: Vec<u32> = source
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
            })
            .collect();

        Self::build(name, dim, data, use_mipmap)
    }

    /// Build a texture from raw ARGB texels. `dimension` must be a power of two
    /// and `texels` must hold exactly `dimension * dimension` entries.
    pub fn from_texels(
        name: impl Into<String>,
        dimension: u32,
        texels: Vec<u32>,
        use_mipmap: bool,
    ) -> Result<Self, TextureError> {
        if !dimension.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo(dimension));
        }
        let expected = (dimension * dimension) as usize;
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self::build(name.into(), dimension, texels, use_mipmap))
    }

    fn build(name: String, dimension: u32, data: Vec<u32>, use_mipmap: bool) -> Self {
        let has_transparency = data.iter().any(|&t| (t >> 24) < 255);
        let mut texture = Self {
            name,
            dimension,
            levels: vec![data],
            mip_entries: Vec::new(),
            has_transparency,
            environment_cast: false,
            lighting_cast: true,
        };
        if use_mipmap {
            texture.generate_mipmaps();
        }
        texture
    }

    /// Builds the box-filtered mipmap pyramid. Does nothing if it already
    /// exists or the texture is a single texel.
    pub fn generate_mipmaps(&mut self) {
        if self.dimension <= 1 || self.has_mipmap() {
            return;
        }

        let level_count = 1 + (0.1 + (self.dimension as f32).log2()) as usize;
        self.mip_entries.push(1.0);

        let mut dim = (self.dimension >> 1) as usize;
        for level in 1..level_count {
            let upper = &self.levels[level - 1];
            let upper_dim = dim << 1;
            let mut map = Vec::with_capacity(dim * dim);
            for i in 0..dim {
                let row = 2 * i * upper_dim;
                for j in 0..dim {
                    let src = row + 2 * j;
                    map.push(average4([
                        upper[src],
                        upper[src + 1],
                        upper[src + upper_dim],
                        upper[src + upper_dim + 1],
                    ]));
                }
            }
            self.levels.push(map);
            self.mip_entries.push(4f32.powi(level as i32));
            dim >>= 1;
        }
    }

    /// Chooses the mip level for a triangle from its doubled screen-space area
    /// and doubled texel-space area (both measured at level 0).
    ///
    /// Returns 0 when the texture has no mipmaps.
    pub fn select_mip_level(&self, screen_area: f32, texel_area: f32) -> usize {
        if self.mip_entries.len() < 2 {
            return 0;
        }
        let ratio = texel_area.abs() / (screen_area.abs() + 1.0);
        let last = self.mip_entries.len() - 1;
        if ratio < self.mip_entries[1] {
            0
        } else if ratio >= self.mip_entries[last] {
            last
        } else {
            let mut level = 0;
            while ratio >= self.mip_entries[level + 1] {
                level += 1;
            }
            level
        }
    }

    /// Sample level `level` at texel-space coordinates, wrapping on both axes.
    #[inline]
    pub fn sample(&self, level: usize, u: f32, v: f32) -> u32 {
        let dim = self.level_dimension(level) as i32;
        let bound = dim - 1;
        let x = (u as i32) & bound;
        let y = (v as i32) & bound;
        self.levels[level][(y * dim + x) as usize]
    }

    // ============ Accessors ============

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width (and height) of level 0.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub fn level_dimension(&self, level: usize) -> u32 {
        (self.dimension >> level).max(1)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> &[u32] {
        &self.levels[level]
    }

    pub fn mip_entries(&self) -> &[f32] {
        &self.mip_entries
    }

    pub fn has_data(&self) -> bool {
        !self.levels[0].is_empty()
    }

    pub fn has_mipmap(&self) -> bool {
        !self.mip_entries.is_empty()
    }

    pub fn has_transparency(&self) -> bool {
        self.has_transparency
    }

    pub fn is_environment_cast(&self) -> bool {
        self.environment_cast
    }

    pub fn set_environment_cast(&mut self, cast: bool) {
        self.environment_cast = cast;
    }

    pub fn is_lighting_cast(&self) -> bool {
        self.lighting_cast
    }

    pub fn set_lighting_cast(&mut self, cast: bool) {
        self.lighting_cast = cast;
    }
}

/// Smallest supported power-of-two dimension that holds `size`.
pub fn texture_dimension(size: u32) -> u32 {
    size.clamp(MIN_DIMENSION, MAX_DIMENSION).next_power_of_two()
}

/// Per-channel average of four ARGB texels, alpha included.
#[inline]
fn average4(texels: [u32; 4]) -> u32 {
    let mut out = 0u32;
    for shift in [24u32, 16, 8, 0] {
        let sum: u32 = texels.iter().map(|t| (t >> shift) & 0xff).sum();
        out |= (sum >> 2) << shift;
    }
    out
}
