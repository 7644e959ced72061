//! Scene graph: an ordered list of meshes plus lights.
//!
//! The scene owns every [`Mesh`] it renders and hands out a [`MeshId`] for
//! each one. Ids start at 1 and are never reused, so the selection buffer can
//! use 0 for "no mesh".

use std::sync::Arc;

use log::{debug, warn};

use crate::aabb::Aabb;
use crate::config::RenderMode;
use crate::light::{Light, LightingMode, MAX_LIGHTS};
use crate::material::Material;
use crate::math::mat3x4::Mat3x4;
use crate::math::vec3::Vec3;
use crate::mesh::{Mesh, MeshId, ScaleAnchor};
use crate::texture::Texture;

/// Diffuse color of a ground plane created without an explicit color.
const DEFAULT_GROUND_COLOR: u32 = 0xcccccc;

#[derive(Debug, Clone)]
pub struct Scene {
    children: Vec<Mesh>,
    aabb: Option<Aabb>,
    lights: Vec<Light>,
    light_markers: Vec<MeshId>,
    ground_plane: Option<MeshId>,
    max_child_id: u32,
    rot_mat: Mat3x4,
    xform_mat: Mat3x4,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            aabb: None,
            lights: Vec::new(),
            light_markers: Vec::new(),
            ground_plane: None,
            max_child_id: 1,
            rot_mat: Mat3x4::identity(),
            xform_mat: Mat3x4::identity(),
        }
    }

    // ============ Children ============

    /// Adds a mesh and returns its id.
    pub fn add_child(&mut self, mut mesh: Mesh) -> MeshId {
        let id = MeshId(self.max_child_id);
        self.max_child_id += 1;
        mesh.set_id(id);
        self.children.push(mesh);
        id
    }

    pub fn remove_child(&mut self, id: MeshId) -> Option<Mesh> {
        let pos = self.children.iter().position(|m| m.id() == Some(id))?;
        self.light_markers.retain(|&m| m != id);
        if self.ground_plane == Some(id) {
            self.ground_plane = None;
        }
        Some(self.children.remove(pos))
    }

    pub fn children(&self) -> &[Mesh] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Mesh] {
        &mut self.children
    }

    pub fn mesh_by_id(&self, id: MeshId) -> Option<&Mesh> {
        self.children.iter().find(|m| m.id() == Some(id))
    }

    pub fn mesh_by_id_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.children.iter_mut().find(|m| m.id() == Some(id))
    }

    pub fn meshes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Mesh> + 'a {
        self.children.iter().filter(move |m| m.name() == name)
    }

    /// True when no child has renderable geometry.
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(Mesh::is_trivial)
    }

    /// Initializes every child, then the scene bounding box if it is missing.
    pub fn init(&mut self) {
        for child in &mut self.children {
            child.init();
        }
        if self.aabb.is_none() {
            self.calc_aabb();
        }
    }

    /// Recomputes the bounding box over the non-trivial children. The box is
    /// `None` when there are none.
    pub fn calc_aabb(&mut self) {
        let mut aabb = Aabb::empty();
        for child in self.children.iter().filter(|c| !c.is_trivial()) {
            let child_box = child
                .aabb()
                .unwrap_or_else(|| Aabb::from_vertices(child.vertices()));
            aabb.union(&child_box);
        }
        self.aabb = (!aabb.is_empty()).then_some(aabb);
    }

    pub fn aabb(&self) -> Option<Aabb> {
        self.aabb
    }

    // ============ Lighting ============

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Accumulated view rotation, as last set by the renderer.
    pub fn rot_mat(&self) -> &Mat3x4 {
        &self.rot_mat
    }

    /// Rotation-free frame matrix used for lights and position-fixed meshes.
    pub fn xform_mat(&self) -> &Mat3x4 {
        &self.xform_mat
    }

    /// Stores the per-frame lighting matrices and moves every light with them.
    pub fn update_lighting_transform(&mut self, rot_mat: &Mat3x4, xform_mat: &Mat3x4) {
        self.rot_mat.copy_from(rot_mat);
        self.xform_mat.copy_from(xform_mat);
        for light in &mut self.lights {
            light.update_transform(xform_mat);
        }
    }

    /// Adds a light and a small icosahedron marker at its position. The marker
    /// is only visible when `show_marker` is set and the light is enabled.
    ///
    /// Returns the marker's id, or `None` when the scene already holds
    /// [`MAX_LIGHTS`] lights.
    pub fn add_light(&mut self, light: Light, show_marker: bool) -> Option<MeshId> {
        if self.lights.len() >= MAX_LIGHTS {
            warn!(
                "scene already has {MAX_LIGHTS} lights, ignoring '{}'",
                light.name
            );
            return None;
        }
        if self.aabb.is_none() {
            self.calc_aabb();
        }
        let extent = self
            .aabb
            .map(|b| {
                let size = b.size();
                size.x.max(size.z)
            })
            .filter(|e| *e > 0.0)
            .unwrap_or(1.0);
        let size = 0.01 * extent;

        let material = Material::new(light.name.clone(), light.diffuse_color);
        let mut marker = Mesh::icosahedron()
            .with_material(Arc::new(material))
            .with_render_mode(Some(RenderMode::Flat))
            .with_visible(show_marker && light.enabled);
        marker.set_name(light.name.clone());
        marker.set_position_fixed(true);
        marker.init();
        marker.resize(Vec3::new(size, size, size), ScaleAnchor::Center);
        marker.translate(light.position);

        debug!(
            "adding light '{}' at ({}, {}, {}) with marker size {size}",
            light.name, light.position.x, light.position.y, light.position.z
        );
        self.lights.push(light);
        let id = self.add_child(marker);
        self.light_markers.push(id);
        Some(id)
    }

    /// Removes every light and its marker and resets the lighting matrices.
    pub fn clear_lights(&mut self) {
        let markers = std::mem::take(&mut self.light_markers);
        self.children
            .retain(|m| m.id().map_or(true, |id| !markers.contains(&id)));
        self.lights.clear();
        self.rot_mat.set_identity();
        self.xform_mat.set_identity();
    }

    /// Replaces the scene lights with a key, fill and back light around the
    /// bounding box. The lights are enabled for every mode except
    /// [`LightingMode::Standard`].
    pub fn setup_three_point_lighting(&mut self, mode: LightingMode, show: bool) {
        self.clear_lights();
        if self.aabb.is_none() {
            self.calc_aabb();
        }
        let Some(aabb) = self.aabb else {
            return;
        };
        let (min, max) = (aabb.min, aabb.max);
        let [key, fill, back] = mode.three_point_colors();
        let enabled = mode.is_lit();
        let lights = [
            Light::new("key", Vec3::new(min.x, 0.1 * max.y, 0.0), key, enabled),
            Light::new("fill", Vec3::new(0.0, 0.5 * max.y, max.z), fill, enabled),
            Light::new("back", Vec3::new(max.x, max.y, min.z), back, enabled),
        ];
        for light in lights {
            self.add_light(light, show);
        }
    }

    // ============ Ground Plane ============

    /// Adds (or replaces) a double-sided ground plane just under the scene.
    ///
    /// The plane is drawn as a wireframe grid unless `render_mode` says
    /// otherwise. A texture is only used in the textured modes. Returns `None`
    /// for a scene without geometry.
    pub fn make_ground_plane(
        &mut self,
        color: Option<u32>,
        texture: Option<Arc<Texture>>,
        render_mode: Option<RenderMode>,
    ) -> Option<MeshId> {
        if let Some(old) = self.ground_plane.take() {
            self.remove_child(old);
        }
        if self.aabb.is_none() {
            self.calc_aabb();
        }
        let aabb = self.aabb?;

        let mode = render_mode.unwrap_or(RenderMode::Wireframe);
        let textured = texture.is_some()
            && matches!(
                mode,
                RenderMode::Texture | RenderMode::TextureFlat | RenderMode::TextureSmooth
            );
        let unlit = matches!(
            mode,
            RenderMode::Point | RenderMode::Wireframe | RenderMode::Flat | RenderMode::Texture
        );

        let material = Material::new("groundplane", color.unwrap_or(DEFAULT_GROUND_COLOR))
            .with_lighting_cast(!unlit);
        let mut plane = Mesh::ground_plane(&aabb, textured)
            .with_material(Arc::new(material))
            .with_render_mode(Some(mode));
        if textured {
            if let Some(mut texture) = texture {
                if unlit {
                    Arc::make_mut(&mut texture).set_lighting_cast(false);
                }
                plane.set_texture(Some(texture));
            }
        }
        plane.init();

        let id = self.add_child(plane);
        self.ground_plane = Some(id);
        Some(id)
    }

    pub fn ground_plane(&self) -> Option<MeshId> {
        self.ground_plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::FaceList;
    use approx::assert_relative_eq;

    fn scene_with_cube(size: f32) -> Scene {
        let mut scene = Scene::new();
        scene.add_child(Mesh::cube(size));
        scene.init();
        scene
    }

    #[test]
    fn ids_start_at_one_and_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add_child(Mesh::cube(1.0));
        let b = scene.add_child(Mesh::cube(1.0));
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert!(scene.remove_child(a).is_some());
        let c = scene.add_child(Mesh::cube(1.0));
        assert_eq!(c.get(), 3);
        assert!(scene.mesh_by_id(a).is_none());
        assert_eq!(scene.mesh_by_id(c).and_then(Mesh::id), Some(c));
    }

    #[test]
    fn aabb_ignores_trivial_children() {
        let mut scene = Scene::new();
        scene.add_child(Mesh::new("dot", vec![100.0, 100.0, 100.0], FaceList::default()));
        assert!(scene.is_empty());
        scene.add_child(Mesh::cube(2.0));
        scene.init();
        let aabb = scene.aabb().unwrap();
        assert_eq!(aabb.max, Vec3::new(1.0, 1.0, 1.0));
        assert!(!scene.is_empty());
    }

    #[test]
    fn empty_scene_has_no_box() {
        let mut scene = Scene::new();
        scene.init();
        assert!(scene.aabb().is_none());
        assert!(scene.make_ground_plane(None, None, None).is_none());
    }

    #[test]
    fn meshes_are_found_by_name() {
        let mut scene = scene_with_cube(1.0);
        scene.add_child(Mesh::icosahedron());
        assert_eq!(scene.meshes_named("cube").count(), 1);
        assert_eq!(scene.meshes_named("light").count(), 1);
        assert_eq!(scene.meshes_named("teapot").count(), 0);
    }

    #[test]
    fn three_point_lighting_places_key_fill_back() {
        let mut scene = scene_with_cube(2.0);
        scene.setup_three_point_lighting(LightingMode::ThreePoint, true);
        let lights = scene.lights();
        assert_eq!(lights.len(), 3);
        assert_eq!(lights[0].position, Vec3::new(-1.0, 0.1, 0.0));
        assert_eq!(lights[1].position, Vec3::new(0.0, 0.5, 1.0));
        assert_eq!(lights[2].position, Vec3::new(1.0, 1.0, -1.0));
        assert_eq!(lights[2].diffuse_color, 0x0000ff);
        assert!(lights.iter().all(|l| l.enabled));
        // cube plus three markers
        assert_eq!(scene.children().len(), 4);

        let marker = &scene.children()[1];
        assert!(marker.is_position_fixed());
        assert!(marker.is_visible());
        assert_relative_eq!(marker.size().x, 0.02, epsilon = 1e-5);
        let c = marker.aabb().unwrap().center();
        assert_relative_eq!(c.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn relighting_replaces_markers() {
        let mut scene = scene_with_cube(2.0);
        scene.setup_three_point_lighting(LightingMode::Greyscale, false);
        scene.setup_three_point_lighting(LightingMode::Standard, true);
        assert_eq!(scene.lights().len(), 3);
        assert_eq!(scene.children().len(), 4);
        assert!(scene.lights().iter().all(|l| !l.enabled));
        assert!(scene.children()[1..].iter().all(|m| !m.is_visible()));
    }

    #[test]
    fn light_count_is_capped() {
        let mut scene = scene_with_cube(1.0);
        for i in 0..MAX_LIGHTS {
            let light = Light::new(format!("l{i}"), Vec3::ZERO, 0xffffff, true);
            assert!(scene.add_light(light, false).is_some());
        }
        let extra = Light::new("extra", Vec3::ZERO, 0xffffff, true);
        assert!(scene.add_light(extra, false).is_none());
        assert_eq!(scene.lights().len(), MAX_LIGHTS);
    }

    #[test]
    fn lighting_transform_moves_lights() {
        let mut scene = scene_with_cube(2.0);
        scene.setup_three_point_lighting(LightingMode::ThreePoint, false);
        let mut xform = Mat3x4::identity();
        xform.translate(10.0, 0.0, 0.0);
        scene.update_lighting_transform(&Mat3x4::identity(), &xform);
        assert_relative_eq!(scene.lights()[0].transformed_position.x, 9.0);
        assert_eq!(scene.xform_mat(), &xform);
    }

    #[test]
    fn ground_plane_is_replaced_not_duplicated() {
        let mut scene = scene_with_cube(2.0);
        let first = scene.make_ground_plane(Some(0x808080), None, None).unwrap();
        let second = scene.make_ground_plane(None, None, Some(RenderMode::Flat)).unwrap();
        assert_ne!(first, second);
        assert_eq!(scene.children().len(), 2);
        let plane = scene.mesh_by_id(second).unwrap();
        assert!(plane.is_double_sided());
        assert_eq!(plane.render_mode(), Some(RenderMode::Flat));
        assert!(!plane.material().unwrap().is_lighting_cast());
        assert!(plane.aabb().unwrap().max.y < -1.0);
    }

    #[test]
    fn textured_ground_plane_keeps_texture() {
        let mut scene = scene_with_cube(2.0);
        let texture = Arc::new(Texture::from_texels("t", 16, vec![0xffffffff; 256], false).unwrap());
        let id = scene
            .make_ground_plane(None, Some(texture), Some(RenderMode::Texture))
            .unwrap();
        let plane = scene.mesh_by_id(id).unwrap();
        assert!(plane.has_texture());
        assert_eq!(plane.face_count(), 2);
        assert!(!plane.texture().unwrap().is_lighting_cast());
    }
}
