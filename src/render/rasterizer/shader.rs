//! Span shaders: the per-pixel payloads of the filled rasterizers.
//!
//! The scanline skeleton ([`super::scanline`]) decides *which* pixels a
//! triangle covers and interpolates its attributes; a span shader decides
//! *what* each covered pixel becomes. A shader is built once per triangle
//! (or per face) with everything that is constant across it, then
//! [`SpanShader::shade_span`] is called for every row.
//!
//! # Attribute layouts
//!
//! | shader | N | attributes |
//! |--------|---|------------|
//! | [`FlatShader`] | 1 | z |
//! | [`SmoothShader`] | 2 | z, palette index |
//! | [`TextureShader`] | 3 | z, u, v (texels) |
//! | [`TextureFlatShader`] | 3 | z, u, v |
//! | [`TextureSmoothShader`] | 4 | z, palette index, u, v |
//! | [`SphereMapShader`] | 4 | z, palette index, sphere u, sphere v |
//!
//! # Opaque and transparent paths
//!
//! Opaque spans include their right end, write depth, color and selection
//! id. Transparent spans exclude their right end and blend:
//!
//! ```text
//!   out = (fore * opacity + back * (255 - opacity)) >> 8      per channel
//!   out alpha = back alpha | opacity << 24
//! ```
//!
//! Transparent pixels still pass the depth test but do not write depth, so
//! they never hide each other or later opaque geometry. The one exception is
//! the modulated texture path: a texel whose combined opacity is above 250 is
//! treated as solid and does write depth.

use super::scanline::Span;
use crate::colors::{blend, modulate, ALPHA_MASK, OPAQUE};
use crate::material::{palette_index, PALETTE_SIZE};
use crate::render::framebuffer::FrameBuffer;
use crate::texture::Texture;

/// Combined opacity above which a transparent texel is written as solid.
pub const SOLID_OPACITY_THRESHOLD: u32 = 250;

/// Fills one span of a triangle.
pub trait SpanShader<const N: usize> {
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<N>);
}

/// Blends `fore` over the stored color at `index` and writes the selection id.
#[inline]
fn blend_pixel(target: &mut FrameBuffer, index: usize, fore: u32, opacity: u32, id: u32) {
    let back = target.color_at(index);
    let color = (back & ALPHA_MASK) | (opacity << 24) | blend(back, fore, opacity);
    target.write_color(index, color, id);
}

/// Opacity for a material transparency in `0.0..=1.0`.
#[inline]
pub fn material_opacity(transparency: f32) -> u32 {
    ((1.0 - transparency) * 255.0) as u32
}

// ============ Palette Shaders ============

/// One palette color for the whole triangle.
pub struct FlatShader {
    color: u32,
    id: u32,
    /// `None` for opaque materials.
    opacity: Option<u32>,
}

impl FlatShader {
    pub fn new(color: u32, id: u32, opacity: Option<u32>) -> Self {
        Self { color, id, opacity }
    }
}

impl SpanShader<1> for FlatShader {
    #[inline]
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<1>) {
        match self.opacity {
            None => {
                let color = OPAQUE | self.color;
                for (i, [z]) in span.inclusive() {
                    if z > target.depth_at(i) {
                        target.write(i, color, z, self.id);
                    }
                }
            }
            Some(opacity) => {
                for (i, [z]) in span.exclusive() {
                    if z > target.depth_at(i) {
                        blend_pixel(target, i, self.color, opacity, self.id);
                    }
                }
            }
        }
    }
}

/// Gouraud shading through the palette: the interpolated attribute is the
/// palette index itself.
pub struct SmoothShader<'a> {
    palette: &'a [u32; PALETTE_SIZE],
    id: u32,
    opacity: Option<u32>,
}

impl<'a> SmoothShader<'a> {
    pub fn new(palette: &'a [u32; PALETTE_SIZE], id: u32, opacity: Option<u32>) -> Self {
        Self {
            palette,
            id,
            opacity,
        }
    }
}

impl SpanShader<2> for SmoothShader<'_> {
    #[inline]
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<2>) {
        match self.opacity {
            None => {
                for (i, [z, n]) in span.inclusive() {
                    if z > target.depth_at(i) {
                        let color = OPAQUE | self.palette[palette_index(n)];
                        target.write(i, color, z, self.id);
                    }
                }
            }
            Some(opacity) => {
                for (i, [z, n]) in span.exclusive() {
                    if z > target.depth_at(i) {
                        blend_pixel(target, i, self.palette[palette_index(n)], opacity, self.id);
                    }
                }
            }
        }
    }
}

// ============ Texture Shaders ============

/// Unlit texturing: the texel is the pixel.
pub struct TextureShader<'a> {
    texture: &'a Texture,
    level: usize,
    id: u32,
}

impl<'a> TextureShader<'a> {
    pub fn new(texture: &'a Texture, level: usize, id: u32) -> Self {
        Self { texture, level, id }
    }
}

impl SpanShader<3> for TextureShader<'_> {
    #[inline]
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<3>) {
        if !self.texture.has_transparency() {
            for (i, [z, u, v]) in span.inclusive() {
                if z > target.depth_at(i) {
                    target.write(i, self.texture.sample(self.level, u, v), z, self.id);
                }
            }
        } else {
            for (i, [z, u, v]) in span.exclusive() {
                if z > target.depth_at(i) {
                    let texel = self.texture.sample(self.level, u, v);
                    blend_pixel(target, i, texel, texel >> 24, self.id);
                }
            }
        }
    }
}

/// Writes a texel modulated by a shade color, honoring texel alpha and
/// material opacity.
#[inline]
fn write_modulated(
    target: &mut FrameBuffer,
    index: usize,
    z: f32,
    shade: u32,
    texel: u32,
    material_opacity: Option<u32>,
    id: u32,
) {
    let color = modulate(shade, texel);
    match material_opacity {
        None => target.write(index, OPAQUE | color, z, id),
        Some(mat) => {
            let opacity = ((texel >> 24) * mat) >> 8;
            let back = target.color_at(index);
            if opacity > SOLID_OPACITY_THRESHOLD {
                target.write(index, (back & ALPHA_MASK) | (opacity << 24) | color, z, id);
            } else {
                let out = (back & ALPHA_MASK) | (opacity << 24) | blend(back, color, opacity);
                target.write_color(index, out, id);
            }
        }
    }
}

/// Texture modulated by one palette color per triangle.
pub struct TextureFlatShader<'a> {
    texture: &'a Texture,
    level: usize,
    shade: u32,
    id: u32,
    /// `None` when both the material and the texture are opaque.
    material_opacity: Option<u32>,
}

impl<'a> TextureFlatShader<'a> {
    pub fn new(
        texture: &'a Texture,
        level: usize,
        shade: u32,
        id: u32,
        material_opacity: Option<u32>,
    ) -> Self {
        Self {
            texture,
            level,
            shade,
            id,
            material_opacity,
        }
    }
}

impl SpanShader<3> for TextureFlatShader<'_> {
    #[inline]
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<3>) {
        let pixels = if self.material_opacity.is_none() {
            span.inclusive()
        } else {
            span.exclusive()
        };
        for (i, [z, u, v]) in pixels {
            if z > target.depth_at(i) {
                let texel = self.texture.sample(self.level, u, v);
                write_modulated(target, i, z, self.shade, texel, self.material_opacity, self.id);
            }
        }
    }
}

/// Texture modulated by the interpolated palette shade.
pub struct TextureSmoothShader<'a> {
    texture: &'a Texture,
    level: usize,
    palette: &'a [u32; PALETTE_SIZE],
    id: u32,
    material_opacity: Option<u32>,
}

impl<'a> TextureSmoothShader<'a> {
    pub fn new(
        texture: &'a Texture,
        level: usize,
        palette: &'a [u32; PALETTE_SIZE],
        id: u32,
        material_opacity: Option<u32>,
    ) -> Self {
        Self {
            texture,
            level,
            palette,
            id,
            material_opacity,
        }
    }
}

impl SpanShader<4> for TextureSmoothShader<'_> {
    #[inline]
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<4>) {
        let pixels = if self.material_opacity.is_none() {
            span.inclusive()
        } else {
            span.exclusive()
        };
        for (i, [z, n, u, v]) in pixels {
            if z > target.depth_at(i) {
                let texel = self.texture.sample(self.level, u, v);
                let shade = self.palette[palette_index(n)];
                write_modulated(target, i, z, shade, texel, self.material_opacity, self.id);
            }
        }
    }
}

/// Environment mapping: the rotated normal picks a texel of the sphere map,
/// which is modulated by the palette shade.
pub struct SphereMapShader<'a> {
    sphere_map: &'a Texture,
    palette: &'a [u32; PALETTE_SIZE],
    id: u32,
    opacity: Option<u32>,
}

impl<'a> SphereMapShader<'a> {
    pub fn new(
        sphere_map: &'a Texture,
        palette: &'a [u32; PALETTE_SIZE],
        id: u32,
        opacity: Option<u32>,
    ) -> Self {
        Self {
            sphere_map,
            palette,
            id,
            opacity,
        }
    }
}

impl SpanShader<4> for SphereMapShader<'_> {
    #[inline]
    fn shade_span(&self, target: &mut FrameBuffer, span: &Span<4>) {
        match self.opacity {
            None => {
                for (i, [z, n, su, sv]) in span.inclusive() {
                    if z > target.depth_at(i) {
                        let texel = self.sphere_map.sample(0, su, sv);
                        let color = modulate(self.palette[palette_index(n)], texel);
                        target.write(i, OPAQUE | color, z, self.id);
                    }
                }
            }
            Some(opacity) => {
                for (i, [z, n, su, sv]) in span.exclusive() {
                    if z > target.depth_at(i) {
                        let texel = self.sphere_map.sample(0, su, sv);
                        let color = modulate(self.palette[palette_index(n)], texel);
                        let back = target.color_at(i);
                        let out = (back & ALPHA_MASK) | blend(back, color, opacity);
                        target.write_color(i, out, self.id);
                    }
                }
            }
        }
    }
}
