//! The viewer: a scene, a view transform and a renderer behind one API.
//!
//! ```ignore
//! let config = RenderConfig::from_params([("RenderMode", "smooth")])?;
//! let mut viewer = Viewer::new(640, 480, config);
//! viewer.replace_scene(softview::loader::load_obj("teapot.obj", true)?);
//! viewer.render_frame();
//! let pixels = viewer.display_buffer();
//! ```

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, info};

use crate::config::{Definition, RenderConfig, RenderMode};
use crate::error::{LoadError, TextureError};
use crate::loader::{LoadOutcome, LoadTicket, LoadTracker};
use crate::material::Material;
use crate::math::vec3::Vec3;
use crate::mesh::Mesh;
use crate::picking::{self, PickInfo};
use crate::render::framebuffer::FrameView;
use crate::render::renderer::Renderer;
use crate::scene::Scene;
use crate::texture::Texture;
use crate::transform::ViewTransform;

pub struct Viewer {
    config: RenderConfig,
    width: u32,
    height: u32,
    scene: Option<Scene>,
    view: ViewTransform,
    renderer: Renderer,
    default_material: Material,
    sphere_map: Option<Arc<Texture>>,
    scene_loads: LoadTracker,
    sphere_map_loads: LoadTracker,
    needs_update: bool,
}

impl Viewer {
    pub fn new(width: u32, height: u32, config: RenderConfig) -> Self {
        let [rx, ry, rz] = config.init_rotation;
        Self {
            renderer: Renderer::new(width, height, &config),
            view: ViewTransform::new(Vec3::new(rx, ry, rz), config.init_scene_rotation),
            default_material: Material::default_for(config.model_color),
            config,
            width,
            height,
            scene: None,
            sphere_map: None,
            scene_loads: LoadTracker::new("scene"),
            sphere_map_loads: LoadTracker::new("sphere map"),
            needs_update: true,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutable access to the scene. The next [`Self::tick`] reports a
    /// pending frame.
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.needs_update = true;
        self.scene.as_mut()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    // ============ Scene ============

    /// Makes `scene` the displayed scene.
    ///
    /// The configured crease angle is applied to every mesh before the scene
    /// is initialized, the view is fitted to the scene and the lights are set
    /// up. An empty scene clears the view.
    pub fn replace_scene(&mut self, mut scene: Scene) {
        self.needs_update = true;
        if scene.is_empty() {
            info!("clearing the view");
            self.scene = None;
            return;
        }
        if let Some(angle) = self.config.crease_angle {
            for mesh in scene.children_mut() {
                mesh.set_crease_angle(Some(angle));
            }
        }
        scene.init();
        self.view.reset(scene.aabb().as_ref(), self.width, self.height);
        scene.setup_three_point_lighting(self.config.lighting_mode, self.config.show_lights);
        info!(
            "scene applied: {} meshes, {} lights",
            scene.children().len(),
            scene.lights().len()
        );
        self.scene = Some(scene);
    }

    /// Refits the view to the scene and restores the initial rotations.
    pub fn reset_scene(&mut self) {
        let aabb = self.scene.as_ref().and_then(Scene::aabb);
        self.view.reset(aabb.as_ref(), self.width, self.height);
        self.needs_update = true;
    }

    /// The mesh a pick landed on.
    pub fn picked_mesh(&self, info: &PickInfo) -> Option<&Mesh> {
        let id = info.mesh?;
        self.scene.as_ref()?.mesh_by_id(id)
    }

    // ============ Loading ============

    /// Starts a scene load. Only the most recent ticket will be applied.
    pub fn begin_scene_load(&mut self) -> LoadTicket {
        self.scene_loads.begin()
    }

    /// Applies the result of a scene load if `ticket` is still current.
    pub fn complete_scene_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Scene, LoadError>,
    ) -> LoadOutcome {
        if !self.scene_loads.complete(ticket) {
            return LoadOutcome::Superseded;
        }
        match result {
            Ok(scene) => {
                self.replace_scene(scene);
                LoadOutcome::Applied
            }
            Err(e) => LoadOutcome::Failed(e),
        }
    }

    pub fn begin_sphere_map_load(&mut self) -> LoadTicket {
        self.sphere_map_loads.begin()
    }

    /// Installs a loaded sphere map if `ticket` is still current.
    pub fn complete_sphere_map_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Texture, TextureError>,
    ) -> LoadOutcome {
        if !self.sphere_map_loads.complete(ticket) {
            return LoadOutcome::Superseded;
        }
        match result {
            Ok(texture) => {
                self.set_sphere_map(Some(Arc::new(texture)));
                LoadOutcome::Applied
            }
            Err(e) => LoadOutcome::Failed(e.into()),
        }
    }

    // ============ Settings ============

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.config = self.config.clone().with_render_mode(mode);
        self.needs_update = true;
    }

    /// Changes the frame resolution. The model keeps its on-screen size.
    pub fn set_definition(&mut self, definition: Definition) {
        if self.config.definition == definition {
            return;
        }
        debug!(
            "definition {} -> {definition} for a {}x{} display",
            self.config.definition, self.width, self.height
        );
        self.config = self.config.clone().with_definition(definition);
        self.renderer.set_definition(definition);
        self.needs_update = true;
    }

    pub fn set_face_culling(&mut self, on: bool) {
        self.config = self.config.clone().with_face_culling(on);
        self.needs_update = true;
    }

    pub fn set_mip_mapping(&mut self, on: bool) {
        self.config = self.config.clone().with_mip_mapping(on);
        self.needs_update = true;
    }

    pub fn set_model_color(&mut self, color: u32) {
        self.config = self.config.clone().with_model_color(color);
        self.default_material = Material::default_for(self.config.model_color);
        self.needs_update = true;
    }

    pub fn set_background(&mut self, top: u32, bottom: u32, on: bool) {
        self.config = self.config.clone().with_background(top, bottom, on);
        self.renderer.set_background(top, bottom, on);
        self.needs_update = true;
    }

    pub fn set_background_image(&mut self, image: Option<RgbaImage>) {
        self.renderer.set_background_image(image);
        self.needs_update = true;
    }

    pub fn set_sphere_map(&mut self, sphere_map: Option<Arc<Texture>>) {
        self.sphere_map = sphere_map;
        self.needs_update = true;
    }

    pub fn sphere_map(&self) -> Option<&Arc<Texture>> {
        self.sphere_map.as_ref()
    }

    /// Resizes the display. Zoom and pan are kept.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.renderer.resize(width, height);
        self.needs_update = true;
    }

    // ============ Interaction ============

    pub fn rotate(&mut self, rx: f32, ry: f32, rz: f32) {
        self.view.rotate(rx, ry, rz);
        self.needs_update = true;
    }

    pub fn rotate_scene(&mut self, degrees: f32) {
        self.view.rotate_scene(degrees);
        self.needs_update = true;
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.view.zoom_by(factor);
        self.needs_update = true;
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.view.pan_by(dx, dy);
        self.needs_update = true;
    }

    /// Advances auto-rotation by one step. Returns whether a new frame
    /// should be rendered.
    pub fn tick(&mut self) -> bool {
        if self.scene.is_some() && self.config.auto_rotate_speed != 0.0 {
            self.view.rotate_scene(self.config.auto_rotate_speed);
            self.needs_update = true;
        }
        self.needs_update
    }

    // ============ Frames ============

    /// Renders the scene (or just the background) and composites it onto the
    /// display buffer.
    pub fn render_frame(&mut self) {
        self.renderer.begin_frame();
        if let Some(scene) = self.scene.as_mut() {
            self.renderer.render(
                scene,
                &self.view,
                &self.config,
                &self.default_material,
                self.sphere_map.as_deref(),
            );
        }
        self.renderer.end_frame();
        self.needs_update = false;
    }

    /// The composited display, ARGB, `width * height` pixels.
    pub fn display_buffer(&self) -> &[u32] {
        self.renderer.display_buffer()
    }

    /// The display as RGBA bytes, ready for an image encoder.
    pub fn to_rgba8(&self) -> Vec<u8> {
        crate::colors::to_rgba8(self.display_buffer())
    }

    /// The last frame's color, depth and selection buffers.
    pub fn frame_buffers(&self) -> FrameView<'_> {
        self.renderer.frame_view()
    }

    /// Picks the mesh under display pixel `(x, y)` in the last frame.
    pub fn pick(&self, x: i32, y: i32) -> PickInfo {
        picking::pick(
            &self.renderer.frame_view(),
            self.config.definition,
            self.width,
            self.height,
            x,
            y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::LightingMode;
    use approx::assert_relative_eq;

    fn cube_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_child(Mesh::cube(2.0));
        scene
    }

    fn viewer(config: RenderConfig) -> Viewer {
        let mut viewer = Viewer::new(48, 48, config);
        viewer.replace_scene(cube_scene());
        viewer.render_frame();
        viewer
    }

    #[test]
    fn picking_finds_the_cube() {
        let viewer = viewer(RenderConfig::default());
        let hit = viewer.pick(24, 24);
        let mesh = viewer.picked_mesh(&hit).unwrap();
        assert_eq!(mesh.name(), "cube");
        assert!(hit.depth.is_finite());

        let miss = viewer.pick(0, 0);
        assert_eq!(miss.mesh, None);
        assert_eq!(miss.depth, f32::NEG_INFINITY);
    }

    #[test]
    fn definition_round_trip_restores_the_picture() {
        let mut viewer = viewer(RenderConfig::default());
        let before = viewer.display_buffer().to_vec();

        viewer.set_definition(Definition::High);
        viewer.render_frame();
        assert_eq!(viewer.frame_buffers().width, 96);
        assert!(viewer.pick(24, 24).mesh.is_some());

        viewer.set_definition(Definition::Low);
        viewer.render_frame();
        assert_eq!(viewer.frame_buffers().width, 24);
        assert!(viewer.pick(24, 24).mesh.is_some());

        viewer.set_definition(Definition::Standard);
        viewer.render_frame();
        assert_eq!(viewer.display_buffer(), &before[..]);
    }

    #[test]
    fn crease_angle_applies_to_every_mesh() {
        let config = RenderConfig::default().with_crease_angle(Some(30.0));
        let viewer = viewer(config);
        let cube = viewer.scene().unwrap().meshes_named("cube").next().unwrap();
        assert_eq!(cube.crease_angle(), Some(30.0));
        // one normal per corner when creased
        assert_eq!(cube.vertex_normal_indices().unwrap().len(), 24);
    }

    #[test]
    fn empty_scene_clears_the_view() {
        let mut viewer = viewer(RenderConfig::default().with_background(0x102030, 0x102030, true));
        viewer.replace_scene(Scene::new());
        assert!(viewer.scene().is_none());
        viewer.render_frame();
        assert!(viewer.display_buffer().iter().all(|&c| c == 0xff102030));
    }

    #[test]
    fn stale_scene_loads_are_dropped() {
        let mut viewer = Viewer::new(32, 32, RenderConfig::default());
        let first = viewer.begin_scene_load();
        let second = viewer.begin_scene_load();

        let outcome = viewer.complete_scene_load(first, Ok(cube_scene()));
        assert!(matches!(outcome, LoadOutcome::Superseded));
        assert!(viewer.scene().is_none());

        let outcome = viewer.complete_scene_load(second, Err(LoadError::Empty("x.obj".into())));
        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Empty(_))));
        assert!(viewer.scene().is_none());

        let third = viewer.begin_scene_load();
        assert!(viewer.complete_scene_load(third, Ok(cube_scene())).is_applied());
        assert!(viewer.scene().is_some());
    }

    #[test]
    fn sphere_map_loads_follow_the_latest_request() {
        let mut viewer = Viewer::new(32, 32, RenderConfig::default());
        let stale = viewer.begin_sphere_map_load();
        let current = viewer.begin_sphere_map_load();
        let map = || Texture::from_texels("sphere", 16, vec![0xffffffff; 256], false);

        assert!(matches!(
            viewer.complete_sphere_map_load(stale, map()),
            LoadOutcome::Superseded
        ));
        assert!(viewer.sphere_map().is_none());
        assert!(viewer.complete_sphere_map_load(current, map()).is_applied());
        assert!(viewer.sphere_map().is_some());
    }

    #[test]
    fn auto_rotation_requests_frames() {
        let config = RenderConfig::default().with_auto_rotate_speed(10.0);
        let mut viewer = viewer(config);
        assert!(viewer.tick());
        assert_relative_eq!(viewer.view().scene_rotation(), 10.0);

        let mut still = self::viewer(RenderConfig::default());
        assert!(!still.tick());
        still.zoom_by(1.1);
        assert!(still.tick());
    }

    #[test]
    fn three_point_lighting_adds_markers() {
        let config = RenderConfig::default().with_lighting(LightingMode::ThreePoint, true);
        let viewer = viewer(config);
        let scene = viewer.scene().unwrap();
        assert_eq!(scene.lights().len(), 3);
        assert_eq!(scene.children().len(), 4);
        assert!(scene.meshes_named("key").all(|m| m.is_visible() && m.is_position_fixed()));
    }
}
