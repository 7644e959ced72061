//! The rasterizer family.
//!
//! Every mesh is drawn by exactly one routine, chosen by [`Shading::resolve`]
//! from the render mode (the mesh's own override wins over the viewer's) and
//! from which textures are available:
//!
//! | mode | drawn as |
//! |------|----------|
//! | `point` | [`point::render_points`] |
//! | `wireframe` | [`wireframe::render_wireframe`] |
//! | `flat` | flat |
//! | `smooth` | smooth |
//! | `texture` | unlit texture, or flat without a texture |
//! | `textureflat` | texture x flat shade, or flat without a texture |
//! | `texturesmooth` | sphere-mapped when environment-cast and a sphere map is loaded, else texture x smooth shade, else smooth |
//!
//! The filled routines share the face iteration in [`visible_faces`], the fan
//! triangulation in [`FanTriangles`](crate::face::FanTriangles) and the
//! scanline skeleton in [`scanline`].

mod fill;
mod point;
pub mod scanline;
pub mod shader;
mod wireframe;

pub use point::render_points;
pub use wireframe::render_wireframe;

use crate::config::RenderMode;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::render::arena::{MeshScratch, NormalNeeds};
use crate::render::framebuffer::FrameBuffer;
use crate::texture::Texture;

/// The routine a mesh is drawn with this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    Point,
    Wireframe,
    Flat,
    Smooth,
    Texture,
    TextureFlat,
    TextureSmooth,
    SphereMapped,
}

impl Shading {
    /// Picks the routine for `mesh` under the viewer-wide `mode`.
    pub fn resolve(
        mode: RenderMode,
        mesh: &Mesh,
        material: &Material,
        sphere_map: Option<&Texture>,
    ) -> Shading {
        let has_texture = mesh.has_texture();
        match mesh.render_mode().unwrap_or(mode) {
            RenderMode::Point => Shading::Point,
            RenderMode::Wireframe => Shading::Wireframe,
            RenderMode::Flat => Shading::Flat,
            RenderMode::Smooth => Shading::Smooth,
            RenderMode::Texture if has_texture => Shading::Texture,
            RenderMode::TextureFlat if has_texture => Shading::TextureFlat,
            RenderMode::Texture | RenderMode::TextureFlat => Shading::Flat,
            RenderMode::TextureSmooth => {
                let environment_cast = material.is_environment_cast()
                    || mesh.texture().is_some_and(|t| t.is_environment_cast());
                if environment_cast && sphere_map.is_some_and(Texture::has_data) {
                    Shading::SphereMapped
                } else if has_texture {
                    Shading::TextureSmooth
                } else {
                    Shading::Smooth
                }
            }
        }
    }

    /// Normal data the routine reads from the transform arena.
    pub fn normal_needs(self) -> NormalNeeds {
        match self {
            Shading::Smooth | Shading::TextureSmooth => NormalNeeds {
                vertex_z: true,
                vertex_full: false,
            },
            Shading::SphereMapped => NormalNeeds {
                vertex_z: false,
                vertex_full: true,
            },
            _ => NormalNeeds::default(),
        }
    }
}

/// Everything a rasterizer needs to draw one mesh.
pub struct MeshContext<'a> {
    pub mesh: &'a Mesh,
    pub scratch: &'a MeshScratch,
    pub material: &'a Material,
    /// Selection id written for every covered pixel.
    pub id: u32,
    pub face_culling: bool,
    pub mip_mapping: bool,
}

impl<'a> MeshContext<'a> {
    pub fn new(
        mesh: &'a Mesh,
        scratch: &'a MeshScratch,
        material: &'a Material,
        face_culling: bool,
        mip_mapping: bool,
    ) -> Self {
        Self {
            mesh,
            scratch,
            material,
            id: mesh.selection_id(),
            face_culling,
            mip_mapping,
        }
    }

    /// Back faces are drawn (with flipped normals) for double-sided meshes
    /// and when culling is off.
    #[inline]
    pub fn draw_both_sides(&self) -> bool {
        self.mesh.is_double_sided() || !self.face_culling
    }

    /// Frame-space position of a face corner.
    #[inline]
    fn screen_position(&self, corner: usize) -> Option<(f32, f32, f32)> {
        let v = *self.mesh.faces().corner_indices().get(corner)? as usize * 3;
        let p = self.scratch.vertices().get(v..v + 3)?;
        Some((p[0], p[1], p[2]))
    }

    /// Index of the vertex normal used by a face corner.
    #[inline]
    fn normal_index(&self, corner: usize) -> Option<usize> {
        match self.mesh.vertex_normal_indices() {
            Some(indices) => indices.get(corner).map(|&i| i as usize),
            None => self
                .mesh
                .faces()
                .corner_indices()
                .get(corner)
                .map(|&i| i as usize),
        }
    }

    /// Rotated normal z at a face corner, folded to the front for two-sided
    /// drawing.
    #[inline]
    fn normal_z(&self, corner: usize) -> Option<f32> {
        let nz = *self.scratch.vertex_normal_z().get(self.normal_index(corner)?)?;
        Some(if self.draw_both_sides() { nz.abs() } else { nz })
    }

    /// Fully rotated normal at a face corner, with z folded like
    /// [`Self::normal_z`].
    #[inline]
    fn normal(&self, corner: usize) -> Option<(f32, f32, f32)> {
        let i = self.normal_index(corner)? * 3;
        let n = self.scratch.vertex_normals().get(i..i + 3)?;
        let nz = if self.draw_both_sides() { n[2].abs() } else { n[2] };
        Some((n[0], n[1], nz))
    }

    /// Texture coordinates of a face corner.
    #[inline]
    fn tex_coord(&self, corner: usize) -> Option<(f32, f32)> {
        let t = match self.mesh.tex_coord_indices() {
            Some(indices) => *indices.get(corner)? as usize,
            None => *self.mesh.faces().corner_indices().get(corner)? as usize,
        } * 2;
        let uv = self.mesh.tex_coords().get(t..t + 2)?;
        Some((uv[0], uv[1]))
    }
}

/// Faces that survive back-face culling, with their facing value.
///
/// A face is back-facing when its rotated normal z is negative. When both
/// sides are drawn the facing value is `|nz|` instead.
pub fn visible_faces<'c>(ctx: &'c MeshContext) -> impl Iterator<Item = (usize, f32)> + 'c {
    let both = ctx.draw_both_sides();
    ctx.scratch
        .face_normal_z()
        .iter()
        .take(ctx.mesh.face_count())
        .enumerate()
        .filter_map(move |(face, &nz)| {
            if nz < 0.0 {
                both.then_some((face, -nz))
            } else {
                Some((face, nz))
            }
        })
}

/// Draws one mesh with the given routine.
///
/// `texture` must be set for the textured routines and `sphere_map` for
/// [`Shading::SphereMapped`]; a missing one falls back to flat shading.
pub fn rasterize_mesh(
    target: &mut FrameBuffer,
    ctx: &MeshContext,
    shading: Shading,
    sphere_map: Option<&Texture>,
) {
    let texture = ctx.mesh.texture().map(|t| t.as_ref());
    match (shading, texture, sphere_map) {
        (Shading::Point, _, _) => render_points(target, ctx),
        (Shading::Wireframe, _, _) => render_wireframe(target, ctx),
        (Shading::Smooth, _, _) => fill::render_smooth(target, ctx),
        (Shading::Texture, Some(t), _) => fill::render_texture(target, ctx, t),
        (Shading::TextureFlat, Some(t), _) => fill::render_texture_flat(target, ctx, t),
        (Shading::TextureSmooth, Some(t), _) => fill::render_texture_smooth(target, ctx, t),
        (Shading::SphereMapped, _, Some(s)) => fill::render_sphere_mapped(target, ctx, s),
        _ => fill::render_flat(target, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::FaceList;
    use crate::math::mat3x4::Mat3x4;
    use crate::mesh::MeshId;
    use crate::scene::Scene;
    use std::collections::HashSet;
    use std::sync::Arc;

    const W: u32 = 32;
    const H: u32 = 32;

    struct Target {
        color: Vec<u32>,
        depth: Vec<f32>,
        selection: Vec<u32>,
    }

    impl Target {
        fn new() -> Self {
            let len = (W * H) as usize;
            Self {
                color: vec![0xff000000; len],
                depth: vec![f32::NEG_INFINITY; len],
                selection: vec![0; len],
            }
        }

        fn view(&mut self) -> FrameBuffer<'_> {
            FrameBuffer::new(&mut self.color, &mut self.depth, &mut self.selection, W, H)
        }
    }

    /// A quad in screen space: x and y are pixels, z is depth.
    fn screen_quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> Mesh {
        #[rustfmt::skip]
        let vertices = vec![
            x0, y0, z,   x0, y1, z,   x1, y1, z,   x1, y0, z,
        ];
        // wound so the normal points at +z with y down
        Mesh::new("quad", vertices, FaceList::from_polygons(&[[0, 3, 2, 1]]))
    }

    fn draw(target: &mut Target, mesh: &Mesh, material: &Material, shading: Shading) {
        draw_mapped(target, mesh, material, shading, None);
    }

    fn draw_mapped(
        target: &mut Target,
        mesh: &Mesh,
        material: &Material,
        shading: Shading,
        sphere_map: Option<&Texture>,
    ) {
        let mut scratch = MeshScratch::default();
        scratch.transform(mesh, &Mat3x4::identity(), &Mat3x4::identity(), shading.normal_needs());
        let ctx = MeshContext::new(mesh, &scratch, material, true, true);
        rasterize_mesh(&mut target.view(), &ctx, shading, sphere_map);
    }

    fn textured_quad() -> Mesh {
        let texture = Texture::from_texels("t", 16, vec![0xff00ff00; 256], false).unwrap();
        in_scene(
            screen_quad(4.0, 4.0, 20.0, 20.0, 1.0)
                .with_tex_coords(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0], None)
                .with_texture(Arc::new(texture)),
        )
    }

    fn in_scene(mesh: Mesh) -> Mesh {
        let mut scene = Scene::new();
        let id = scene.add_child(mesh);
        scene.init();
        scene.remove_child(id).unwrap()
    }

    #[test]
    fn flat_quad_is_a_single_palette_color() {
        let mesh = in_scene(screen_quad(4.0, 4.0, 20.0, 20.0, 1.0));
        assert!(mesh.face_normals()[2] > 0.0);
        let material = Material::new("m", 0x3366cc);
        let mut target = Target::new();
        draw(&mut target, &mesh, &material, Shading::Flat);

        let covered: HashSet<u32> = target
            .color
            .iter()
            .zip(&target.selection)
            .filter(|(_, &s)| s != 0)
            .map(|(&c, _)| c)
            .collect();
        assert_eq!(covered.len(), 1);
        let expected = 0xff000000 | material.palette()[255];
        assert!(covered.contains(&expected));
        assert!(target.selection.iter().filter(|&&s| s == 1).count() >= 15 * 15);
    }

    #[test]
    fn nearer_triangle_wins_regardless_of_order() {
        let near = in_scene(screen_quad(0.0, 0.0, 16.0, 16.0, 5.0));
        let far = in_scene(screen_quad(8.0, 8.0, 24.0, 24.0, 1.0));
        let red = Material::new("red", 0xff0000);
        let blue = Material::new("blue", 0x0000ff);

        let mut a = Target::new();
        draw(&mut a, &near, &red, Shading::Flat);
        draw(&mut a, &far, &blue, Shading::Flat);
        let mut b = Target::new();
        draw(&mut b, &far, &blue, Shading::Flat);
        draw(&mut b, &near, &red, Shading::Flat);

        assert_eq!(a.color, b.color);
        let overlap = (12 * W + 12) as usize;
        assert_eq!(a.color[overlap], 0xff000000 | red.palette()[255]);
        assert_eq!(a.depth[overlap], 5.0);
    }

    #[test]
    fn back_faces_are_culled_unless_double_sided() {
        let front = screen_quad(4.0, 4.0, 20.0, 20.0, 1.0);
        let back = Mesh::new("back", front.vertices().to_vec(), FaceList::from_polygons(&[[0, 1, 2, 3]]));
        let mesh = in_scene(back);
        let material = Material::default();

        let mut target = Target::new();
        draw(&mut target, &mesh, &material, Shading::Flat);
        assert!(target.selection.iter().all(|&s| s == 0));

        let mesh = in_scene(mesh.with_double_sided(true));
        draw(&mut target, &mesh, &material, Shading::Flat);
        assert!(target.selection.iter().any(|&s| s != 0));
    }

    #[test]
    fn invisible_material_draws_nothing() {
        let mesh = in_scene(screen_quad(4.0, 4.0, 20.0, 20.0, 1.0));
        let material = Material::new("glass", 0xffffff).with_transparency(1.0);
        let mut target = Target::new();
        draw(&mut target, &mesh, &material, Shading::Flat);
        draw(&mut target, &mesh, &material, Shading::Smooth);
        assert!(target.selection.iter().all(|&s| s == 0));
    }

    #[test]
    fn fully_transparent_meshes_are_skipped_by_every_shaded_variant() {
        let mesh = textured_quad();
        let sphere = Texture::from_texels("s", 16, vec![0xffffffff; 256], false).unwrap();
        let material = Material::new("glass", 0xffffff).with_transparency(1.0);

        for shading in [
            Shading::Flat,
            Shading::Smooth,
            Shading::TextureFlat,
            Shading::TextureSmooth,
            Shading::SphereMapped,
        ] {
            let mut target = Target::new();
            draw_mapped(&mut target, &mesh, &material, shading, Some(&sphere));
            assert!(
                target.selection.iter().all(|&s| s == 0),
                "{shading:?} wrote selection ids"
            );
            assert!(
                target.color.iter().all(|&c| c == 0xff000000),
                "{shading:?} wrote colors"
            );
        }
    }

    #[test]
    fn translucent_sphere_map_blends_like_flat() {
        let mesh = in_scene(screen_quad(4.0, 4.0, 20.0, 20.0, 1.0));
        let sphere = Texture::from_texels("s", 16, vec![0xffffffff; 256], false).unwrap();
        let material = Material::new("frost", 0xffffff).with_transparency(0.5);

        let mut flat = Target::new();
        draw(&mut flat, &mesh, &material, Shading::Flat);
        let mut mapped = Target::new();
        draw_mapped(&mut mapped, &mesh, &material, Shading::SphereMapped, Some(&sphere));

        let center = (12 * W + 12) as usize;
        assert_eq!(flat.color[center], 0xff7f7f7f);
        assert_eq!(mapped.color[center], flat.color[center]);
    }

    #[test]
    fn smooth_coplanar_quad_matches_flat() {
        let mesh = in_scene(screen_quad(4.0, 4.0, 20.0, 20.0, 1.0));
        let material = Material::new("m", 0x808080);
        let mut flat = Target::new();
        draw(&mut flat, &mesh, &material, Shading::Flat);
        let mut smooth = Target::new();
        draw(&mut smooth, &mesh, &material, Shading::Smooth);
        assert_eq!(flat.color, smooth.color);
    }

    #[test]
    fn textured_quad_samples_the_texture() {
        let mesh = textured_quad();
        let material = Material::default();
        assert_eq!(
            Shading::resolve(RenderMode::Texture, &mesh, &material, None),
            Shading::Texture
        );
        let mut target = Target::new();
        draw(&mut target, &mesh, &material, Shading::Texture);
        assert_eq!(target.color[(12 * W + 12) as usize], 0xff00ff00);
    }

    #[test]
    fn resolve_falls_back_without_textures() {
        let mesh = in_scene(screen_quad(0.0, 0.0, 1.0, 1.0, 0.0));
        let m = Material::default();
        assert_eq!(Shading::resolve(RenderMode::Texture, &mesh, &m, None), Shading::Flat);
        assert_eq!(Shading::resolve(RenderMode::TextureFlat, &mesh, &m, None), Shading::Flat);
        assert_eq!(Shading::resolve(RenderMode::TextureSmooth, &mesh, &m, None), Shading::Smooth);

        let sphere = Texture::from_texels("s", 16, vec![0xffffffff; 256], false).unwrap();
        let chrome = Material::new("chrome", 0xffffff).with_environment_cast(true);
        assert_eq!(
            Shading::resolve(RenderMode::TextureSmooth, &mesh, &chrome, Some(&sphere)),
            Shading::SphereMapped
        );

        let wire = mesh.with_render_mode(Some(RenderMode::Wireframe));
        assert_eq!(Shading::resolve(RenderMode::Smooth, &wire, &m, None), Shading::Wireframe);
    }

    #[test]
    fn sphere_mapping_modulates_the_palette() {
        let mesh = in_scene(screen_quad(4.0, 4.0, 20.0, 20.0, 1.0));
        let sphere = Texture::from_texels("s", 16, vec![0xffffffff; 256], false).unwrap();
        let material = Material::new("chrome", 0x808080).with_environment_cast(true);
        let mut scratch = MeshScratch::default();
        let shading = Shading::SphereMapped;
        scratch.transform(&mesh, &Mat3x4::identity(), &Mat3x4::identity(), shading.normal_needs());
        let ctx = MeshContext::new(&mesh, &scratch, &material, true, true);
        let mut target = Target::new();
        rasterize_mesh(&mut target.view(), &ctx, shading, Some(&sphere));

        let pixel = target.color[(12 * W + 12) as usize];
        let expected = 0xff000000 | crate::colors::modulate(material.palette()[255], 0xffffffff);
        assert_eq!(pixel, expected);
        assert_eq!(ctx.id, mesh.selection_id());
        assert_eq!(MeshId(ctx.id), mesh.id().unwrap());
    }
}
