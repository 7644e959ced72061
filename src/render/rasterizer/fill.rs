//! Triangle drivers for the filled shading variants.
//!
//! Every driver walks the visible faces of a mesh, fan-triangulates them,
//! builds [`ScreenVertex`]es with the attributes its shader needs and hands
//! each triangle to [`scan_triangle`]. Triangles whose corners reference
//! missing vertices, normals or texture coordinates are skipped.

use super::scanline::{scan_triangle, ScreenVertex};
use super::shader::{
    material_opacity, FlatShader, SmoothShader, SpanShader, SphereMapShader, TextureFlatShader,
    TextureShader, TextureSmoothShader,
};
use super::{visible_faces, MeshContext};
use crate::face::FanTriangles;
use crate::material::palette_index;
use crate::render::framebuffer::FrameBuffer;
use crate::texture::Texture;

/// Fills one triangle with `shader`, given the attributes of its corners.
#[inline]
fn fill<const N: usize, S: SpanShader<N>>(
    target: &mut FrameBuffer,
    corners: [ScreenVertex<N>; 3],
    shader: &S,
) {
    let (w, h) = (target.width(), target.height());
    scan_triangle(&corners, w, h, |span| shader.shade_span(target, span));
}

/// Builds the three corners of a triangle, or `None` if any lookup fails.
#[inline]
fn corners<const N: usize>(
    ctx: &MeshContext,
    tri: [usize; 3],
    mut attrs: impl FnMut(usize, f32) -> Option<[f32; N]>,
) -> Option<[ScreenVertex<N>; 3]> {
    let mut out = [ScreenVertex::new(0.0, 0.0, [0.0; N]); 3];
    for (slot, corner) in out.iter_mut().zip(tri) {
        let (x, y, z) = ctx.screen_position(corner)?;
        *slot = ScreenVertex::new(x, y, attrs(corner, z)?);
    }
    Some(out)
}

/// Material opacity for the palette variants: `None` when opaque.
#[inline]
fn palette_opacity(transparency: f32) -> Option<u32> {
    (transparency > 0.0).then(|| 255 - (transparency * 255.0) as u32)
}

// ============ Palette Variants ============

pub fn render_flat(target: &mut FrameBuffer, ctx: &MeshContext) {
    let transparency = ctx.material.transparency();
    if transparency >= 1.0 {
        return;
    }
    let palette = ctx.material.palette();
    let opacity = palette_opacity(transparency);
    let faces = ctx.mesh.faces();

    for (face, nz) in visible_faces(ctx) {
        let shader = FlatShader::new(palette[palette_index(nz * 255.0)], ctx.id, opacity);
        for tri in FanTriangles::new(faces.corners(face)) {
            if let Some(c) = corners(ctx, tri, |_, z| Some([z])) {
                fill(target, c, &shader);
            }
        }
    }
}

pub fn render_smooth(target: &mut FrameBuffer, ctx: &MeshContext) {
    let transparency = ctx.material.transparency();
    if transparency >= 1.0 {
        return;
    }
    let shader = SmoothShader::new(
        ctx.material.palette(),
        ctx.id,
        palette_opacity(transparency),
    );
    let faces = ctx.mesh.faces();

    for (face, _) in visible_faces(ctx) {
        for tri in FanTriangles::new(faces.corners(face)) {
            let c = corners(ctx, tri, |corner, z| Some([z, ctx.normal_z(corner)? * 255.0]));
            if let Some(c) = c {
                fill(target, c, &shader);
            }
        }
    }
}

// ============ Texture Variants ============

/// Mip level for a face, chosen from its first triangle.
fn face_mip_level(ctx: &MeshContext, texture: &Texture, face: usize) -> usize {
    if !ctx.mip_mapping || !texture.has_mipmap() {
        return 0;
    }
    let Some([a, b, c]) = FanTriangles::new(ctx.mesh.faces().corners(face)).next() else {
        return 0;
    };
    let dim = texture.dimension() as f32;
    let lookup = |corner: usize| Some((ctx.screen_position(corner)?, ctx.tex_coord(corner)?));
    let (Some(p0), Some(p1), Some(p2)) = (lookup(a), lookup(b), lookup(c)) else {
        return 0;
    };
    let (((x0, y0, _), (u0, v0)), ((x1, y1, _), (u1, v1)), ((x2, y2, _), (u2, v2))) = (p0, p1, p2);
    let screen_area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
    let texel_area = ((u1 - u0) * (v2 - v0) - (u2 - u0) * (v1 - v0)) * dim * dim;
    texture.select_mip_level(screen_area, texel_area)
}

pub fn render_texture(target: &mut FrameBuffer, ctx: &MeshContext, texture: &Texture) {
    let faces = ctx.mesh.faces();
    for (face, _) in visible_faces(ctx) {
        let level = face_mip_level(ctx, texture, face);
        let dim = texture.level_dimension(level) as f32;
        let shader = TextureShader::new(texture, level, ctx.id);
        for tri in FanTriangles::new(faces.corners(face)) {
            let c = corners(ctx, tri, |corner, z| {
                let (u, v) = ctx.tex_coord(corner)?;
                Some([z, u * dim, v * dim])
            });
            if let Some(c) = c {
                fill(target, c, &shader);
            }
        }
    }
}

/// Material opacity for the modulated texture variants: `None` when both the
/// material and the texture are opaque.
fn modulated_opacity(ctx: &MeshContext, texture: &Texture) -> Option<u32> {
    let transparency = ctx.material.transparency();
    (transparency > 0.0 || texture.has_transparency()).then(|| material_opacity(transparency))
}

pub fn render_texture_flat(target: &mut FrameBuffer, ctx: &MeshContext, texture: &Texture) {
    if ctx.material.transparency() >= 1.0 {
        return;
    }
    let palette = ctx.material.palette();
    let opacity = modulated_opacity(ctx, texture);
    let faces = ctx.mesh.faces();

    for (face, nz) in visible_faces(ctx) {
        let level = face_mip_level(ctx, texture, face);
        let dim = texture.level_dimension(level) as f32;
        let shade = palette[palette_index(nz * 255.0)];
        let shader = TextureFlatShader::new(texture, level, shade, ctx.id, opacity);
        for tri in FanTriangles::new(faces.corners(face)) {
            let c = corners(ctx, tri, |corner, z| {
                let (u, v) = ctx.tex_coord(corner)?;
                Some([z, u * dim, v * dim])
            });
            if let Some(c) = c {
                fill(target, c, &shader);
            }
        }
    }
}

pub fn render_texture_smooth(target: &mut FrameBuffer, ctx: &MeshContext, texture: &Texture) {
    if ctx.material.transparency() >= 1.0 {
        return;
    }
    let palette = ctx.material.palette();
    let opacity = modulated_opacity(ctx, texture);
    let faces = ctx.mesh.faces();

    for (face, _) in visible_faces(ctx) {
        let level = face_mip_level(ctx, texture, face);
        let dim = texture.level_dimension(level) as f32;
        let shader = TextureSmoothShader::new(texture, level, palette, ctx.id, opacity);
        for tri in FanTriangles::new(faces.corners(face)) {
            let c = corners(ctx, tri, |corner, z| {
                let n = ctx.normal_z(corner)? * 255.0;
                let (u, v) = ctx.tex_coord(corner)?;
                Some([z, n, u * dim, v * dim])
            });
            if let Some(c) = c {
                fill(target, c, &shader);
            }
        }
    }
}

/// Sphere map texel of a rotated normal: `(nx / 2 + 0.5, 0.5 - ny / 2)`
/// scaled to the map's dimension, truncated and wrapped at the vertex.
#[inline]
fn sphere_coords(nx: f32, ny: f32, dim: u32) -> (f32, f32) {
    let bound = dim.saturating_sub(1) as i32;
    let wrap = |t: f32| ((t * dim as f32) as i32 & bound) as f32;
    (wrap(nx / 2.0 + 0.5), wrap(0.5 - ny / 2.0))
}

/// Environment mapping through a sphere map indexed by the rotated normal.
pub fn render_sphere_mapped(target: &mut FrameBuffer, ctx: &MeshContext, sphere_map: &Texture) {
    let transparency = ctx.material.transparency();
    if transparency >= 1.0 {
        return;
    }
    let shader = SphereMapShader::new(
        sphere_map,
        ctx.material.palette(),
        ctx.id,
        palette_opacity(transparency),
    );
    let dim = sphere_map.dimension();
    let faces = ctx.mesh.faces();

    for (face, _) in visible_faces(ctx) {
        for tri in FanTriangles::new(faces.corners(face)) {
            let c = corners(ctx, tri, |corner, z| {
                let (nx, ny, nz) = ctx.normal(corner)?;
                let (su, sv) = sphere_coords(nx, ny, dim);
                Some([z, nz * 255.0, su, sv])
            });
            if let Some(c) = c {
                fill(target, c, &shader);
            }
        }
    }
}
