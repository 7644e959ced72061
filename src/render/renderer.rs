//! Frame rendering.
//!
//! The [`Renderer`] owns every per-pixel buffer (color, depth, selection,
//! background and the composited display buffer) together with the
//! per-mesh transform arena. A frame is produced in three calls:
//!
//! 1. [`Renderer::begin_frame`] copies the background into the color buffer,
//!    fills depth with `-inf` and clears the selection ids.
//! 2. [`Renderer::render`] transforms, sorts and rasterizes the scene.
//! 3. [`Renderer::end_frame`] resamples the frame onto the display buffer.
//!
//! All buffers are grow-only: shrinking the display keeps the allocations and
//! only the live dimensions change.

use std::sync::Arc;

use image::{imageops::FilterType, RgbaImage};
use log::debug;

use super::arena::TransformArena;
use super::compositor::{composite, fill_gradient};
use super::framebuffer::{FrameBuffer, FrameView};
use super::rasterizer::{rasterize_mesh, MeshContext, Shading};
use super::sorting::{sort_render_list, RenderEntry};
use crate::aabb::Aabb;
use crate::config::{Definition, RenderConfig};
use crate::material::Material;
use crate::math::mat3x4::Mat3x4;
use crate::mesh::MeshId;
use crate::scene::Scene;
use crate::texture::Texture;
use crate::transform::ViewTransform;

/// Background settings, regenerated into the background buffer whenever the
/// frame size or any of them changes.
#[derive(Debug, Clone)]
struct Background {
    top: u32,
    bottom: u32,
    on: bool,
    image: Option<RgbaImage>,
}

pub struct Renderer {
    definition: Definition,
    display_width: u32,
    display_height: u32,
    frame_width: u32,
    frame_height: u32,
    color: Vec<u32>,
    depth: Vec<f32>,
    selection: Vec<u32>,
    background_buffer: Vec<u32>,
    display: Vec<u32>,
    background: Background,
    arena: TransformArena,
    render_list: Vec<RenderEntry>,
    live_ids: Vec<MeshId>,
}

impl Renderer {
    pub fn new(display_width: u32, display_height: u32, config: &RenderConfig) -> Self {
        let mut renderer = Self {
            definition: config.definition,
            display_width: 0,
            display_height: 0,
            frame_width: 0,
            frame_height: 0,
            color: Vec::new(),
            depth: Vec::new(),
            selection: Vec::new(),
            background_buffer: Vec::new(),
            display: Vec::new(),
            background: Background {
                top: config.background_top,
                bottom: config.background_bottom,
                on: config.background_on,
                image: None,
            },
            arena: TransformArena::new(),
            render_list: Vec::new(),
            live_ids: Vec::new(),
        };
        renderer.resize(display_width, display_height);
        renderer
    }

    // ============ Sizing ============

    /// Sets the display size and regrows the frame buffers for the current
    /// definition.
    pub fn resize(&mut self, display_width: u32, display_height: u32) {
        self.display_width = display_width;
        self.display_height = display_height;
        let (fw, fh) = self.definition.frame_size(display_width, display_height);
        self.frame_width = fw;
        self.frame_height = fh;

        let frame_len = (fw * fh) as usize;
        grow("color", &mut self.color, frame_len, 0);
        grow("depth", &mut self.depth, frame_len, f32::NEG_INFINITY);
        grow("selection", &mut self.selection, frame_len, 0);
        grow("background", &mut self.background_buffer, frame_len, 0);
        grow(
            "display",
            &mut self.display,
            (display_width * display_height) as usize,
            0,
        );
        self.generate_background();
    }

    pub fn set_definition(&mut self, definition: Definition) {
        if self.definition != definition {
            self.definition = definition;
            self.resize(self.display_width, self.display_height);
        }
    }

    /// The requested definition. The one actually used may fall back to
    /// standard for tiny displays, see [`Self::effective_definition`].
    pub fn definition(&self) -> Definition {
        self.definition
    }

    pub fn effective_definition(&self) -> Definition {
        self.definition
            .effective(self.display_width, self.display_height)
    }

    /// Frame pixels per display pixel along each axis.
    pub fn frame_scale(&self) -> f32 {
        match self.effective_definition() {
            Definition::Low => 0.5,
            Definition::Standard => 1.0,
            Definition::High => 2.0,
        }
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    // ============ Background ============

    pub fn set_background(&mut self, top: u32, bottom: u32, on: bool) {
        self.background.top = top & 0x00ff_ffff;
        self.background.bottom = bottom & 0x00ff_ffff;
        self.background.on = on;
        self.generate_background();
    }

    /// Replaces the gradient with an image stretched over the frame, or goes
    /// back to the gradient with `None`.
    pub fn set_background_image(&mut self, image: Option<RgbaImage>) {
        self.background.image = image;
        self.generate_background();
    }

    fn generate_background(&mut self) {
        let (w, h) = (self.frame_width, self.frame_height);
        let len = (w * h) as usize;
        let buffer = &mut self.background_buffer[..len];
        let alpha = if self.background.on { 0xff00_0000 } else { 0 };

        match &self.background.image {
            Some(image) if image.width() > 0 && image.height() > 0 && len > 0 => {
                let resized;
                let source = if image.dimensions() == (w, h) {
                    image
                } else {
                    resized = image::imageops::resize(image, w, h, FilterType::Triangle);
                    &resized
                };
                for (out, p) in buffer.iter_mut().zip(source.pixels()) {
                    let [r, g, b, _] = p.0;
                    *out = alpha | (r as u32) << 16 | (g as u32) << 8 | b as u32;
                }
            }
            _ => fill_gradient(
                buffer,
                w,
                h,
                self.background.top,
                self.background.bottom,
                self.background.on,
            ),
        }
    }

    // ============ Frame ============

    pub fn begin_frame(&mut self) {
        let len = (self.frame_width * self.frame_height) as usize;
        self.color[..len].copy_from_slice(&self.background_buffer[..len]);
        self.depth[..len].fill(f32::NEG_INFINITY);
        self.selection[..len].fill(0);
    }

    /// Transforms and rasterizes every non-trivial mesh of `scene`.
    ///
    /// Meshes are sorted opaque-first (near to far) then transparent (far to
    /// near). Position-fixed meshes use the scene's rotation-free lighting
    /// matrix and untransformed normals. Invisible meshes are transformed but
    /// not drawn.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        view: &ViewTransform,
        config: &RenderConfig,
        default_material: &Material,
        sphere_map: Option<&Texture>,
    ) {
        if scene.is_empty() {
            self.arena.clear();
            return;
        }
        if scene.aabb().is_none() {
            scene.calc_aabb();
        }
        let Some(aabb) = scene.aabb() else {
            return;
        };
        let center = aabb.center();
        let (w, h) = (self.frame_width, self.frame_height);
        let scale = self.frame_scale();
        let xform = view.frame_matrix(center, w, h, scale);
        let lighting = view.lighting_matrix(center, w, h, scale);
        let identity = Mat3x4::identity();
        scene.update_lighting_transform(&identity, &lighting);

        self.render_list.clear();
        for mesh in scene.children().iter().filter(|m| !m.is_trivial()) {
            let Some(id) = mesh.id() else {
                continue;
            };
            let center = mesh
                .aabb()
                .unwrap_or_else(|| Aabb::from_vertices(mesh.vertices()))
                .center();
            self.render_list.push(RenderEntry::new(
                id,
                xform.transform_z(center),
                mesh.is_transparent(default_material),
            ));
        }
        sort_render_list(&mut self.render_list);

        let len = (w * h) as usize;
        let mut target = FrameBuffer::new(
            &mut self.color[..len],
            &mut self.depth[..len],
            &mut self.selection[..len],
            w,
            h,
        );
        for entry in &self.render_list {
            let Some(mesh) = scene.mesh_by_id(entry.id) else {
                continue;
            };
            let material = mesh.material().map_or(default_material, Arc::as_ref);
            let shading = Shading::resolve(config.render_mode, mesh, material, sphere_map);
            let (vertex_mat, normal_mat) = if mesh.is_position_fixed() {
                (&lighting, &identity)
            } else {
                (&xform, view.rotation())
            };

            let scratch = self.arena.scratch_mut(mesh, entry.id);
            scratch.transform(mesh, vertex_mat, normal_mat, shading.normal_needs());
            if mesh.is_visible() {
                let ctx = MeshContext::new(
                    mesh,
                    scratch,
                    material,
                    config.face_culling,
                    config.mip_mapping,
                );
                rasterize_mesh(&mut target, &ctx, shading, sphere_map);
            }
        }

        self.live_ids.clear();
        self.live_ids.extend(self.render_list.iter().map(|e| e.id));
        self.arena.retain_ids(&self.live_ids);
    }

    /// Resamples the frame onto the display buffer.
    pub fn end_frame(&mut self) {
        let frame_len = (self.frame_width * self.frame_height) as usize;
        let display_len = (self.display_width * self.display_height) as usize;
        composite(
            self.definition,
            &self.color[..frame_len],
            self.frame_width,
            self.frame_height,
            &mut self.display[..display_len],
            self.display_width,
            self.display_height,
        );
    }

    // ============ Output ============

    /// The composited ARGB display buffer.
    pub fn display_buffer(&self) -> &[u32] {
        &self.display[..(self.display_width * self.display_height) as usize]
    }

    /// Read-only access to the frame's color, depth and selection buffers.
    pub fn frame_view(&self) -> FrameView<'_> {
        let len = (self.frame_width * self.frame_height) as usize;
        FrameView {
            color: &self.color[..len],
            depth: &self.depth[..len],
            selection: &self.selection[..len],
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Number of meshes with live transform scratch buffers.
    pub fn cached_mesh_count(&self) -> usize {
        self.arena.len()
    }
}

/// Grows `buffer` to at least `len` elements. Existing capacity is kept when
/// the frame shrinks.
fn grow<T: Copy>(name: &str, buffer: &mut Vec<T>, len: usize, fill: T) {
    if buffer.len() < len {
        debug!("growing {name} buffer from {} to {len} pixels", buffer.len());
        buffer.resize(len, fill);
    }
}
