//! Mesh geometry and its derived per-mesh data.
//!
//! A [`Mesh`] owns model-space geometry in flat buffers:
//!
//! - `vertices`: `[x, y, z, x, y, z, ...]`
//! - `faces`: a [`FaceList`] of polygons over the vertex indices
//! - `face_normals`: one xyz triple per face
//! - `vertex_normals`: one xyz triple per vertex, or per face corner when the
//!   normals were computed with a crease angle (see `vertex_normal_indices`)
//! - `tex_coords`: `[u, v, u, v, ...]`, addressed by vertex index or by the
//!   corner-parallel `tex_coord_indices`
//!
//! Meshes are created by a loader or procedurally and must be [`init`]ed once
//! before they are rendered. Per-frame transformed copies of the geometry are
//! not stored here; they live in the renderer's transform arena.
//!
//! [`init`]: Mesh::init

use std::sync::Arc;

use crate::aabb::Aabb;
use crate::config::RenderMode;
use crate::face::FaceList;
use crate::material::Material;
use crate::math::batch::{
    normalize_vectors, normalize_vectors_in_place, transform_vectors, transform_vectors_in_place,
};
use crate::math::mat3x4::Mat3x4;
use crate::math::vec3::Vec3;
use crate::texture::Texture;

/// Identity of a mesh inside a scene. Written into the selection buffer, so
/// `0` is reserved for "no mesh".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) u32);

impl MeshId {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Pivot used by [`Mesh::rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPivot {
    /// The mesh's accumulated translation.
    Axis,
    /// The model-space origin, so the mesh orbits the scene.
    Scene,
    /// The center of the mesh's bounding box.
    #[default]
    Center,
}

/// Which side of the bounding box stays in place when scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleAnchor {
    /// The minimum corner stays fixed; the mesh grows towards `+x, +y, +z`.
    Plus,
    /// The maximum corner stays fixed.
    Minus,
    /// The bounding-box center stays fixed.
    #[default]
    Center,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    id: u32,
    vertices: Vec<f32>,
    faces: FaceList,
    face_normals: Vec<f32>,
    vertex_normals: Vec<f32>,
    vertex_normal_indices: Option<Vec<u32>>,
    tex_coords: Vec<f32>,
    tex_coord_indices: Option<Vec<u32>>,
    aabb: Option<Aabb>,
    material: Option<Arc<Material>>,
    texture: Option<Arc<Texture>>,
    crease_angle: Option<f32>,
    double_sided: bool,
    visible: bool,
    position_fixed: bool,
    render_mode: Option<RenderMode>,
    rotation: Vec3,
    translation: Vec3,
    scaling: Vec3,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<f32>, faces: FaceList) -> Self {
        Self {
            name: name.into(),
            id: 0,
            vertices,
            faces,
            face_normals: Vec::new(),
            vertex_normals: Vec::new(),
            vertex_normal_indices: None,
            tex_coords: Vec::new(),
            tex_coord_indices: None,
            aabb: None,
            material: None,
            texture: None,
            crease_angle: None,
            double_sided: false,
            visible: true,
            position_fixed: false,
            render_mode: None,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            scaling: Vec3::ONE,
        }
    }

    // ============ Builders ============

    /// Supplies vertex normals instead of computing them in [`Mesh::init`].
    /// `indices`, when given, must be parallel to the face corners.
    pub fn with_vertex_normals(mut self, normals: Vec<f32>, indices: Option<Vec<u32>>) -> Self {
        self.vertex_normals = normals;
        self.vertex_normal_indices = indices;
        self
    }

    /// Texture coordinates, optionally indexed per face corner.
    pub fn with_tex_coords(mut self, tex_coords: Vec<f32>, indices: Option<Vec<u32>>) -> Self {
        self.tex_coords = tex_coords;
        self.tex_coord_indices = indices;
        self
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_crease_angle(mut self, degrees: Option<f32>) -> Self {
        self.set_crease_angle(degrees);
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    pub fn with_render_mode(mut self, mode: Option<RenderMode>) -> Self {
        self.render_mode = mode;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    // ============ Accessors ============

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The id assigned by the owning scene, if any.
    pub fn id(&self) -> Option<MeshId> {
        (self.id != 0).then_some(MeshId(self.id))
    }

    pub(crate) fn set_id(&mut self, id: MeshId) {
        self.id = id.0;
    }

    /// Raw selection id written by the rasterizers.
    #[inline]
    pub(crate) fn selection_id(&self) -> u32 {
        self.id
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn faces(&self) -> &FaceList {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.face_count()
    }

    pub fn face_normals(&self) -> &[f32] {
        &self.face_normals
    }

    pub fn vertex_normals(&self) -> &[f32] {
        &self.vertex_normals
    }

    /// Corner-parallel normal indices, present after creased normal
    /// computation. When absent, normals are addressed by vertex index.
    pub fn vertex_normal_indices(&self) -> Option<&[u32]> {
        self.vertex_normal_indices.as_deref()
    }

    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    pub fn tex_coord_indices(&self) -> Option<&[u32]> {
        self.tex_coord_indices.as_deref()
    }

    pub fn aabb(&self) -> Option<Aabb> {
        self.aabb
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn set_material(&mut self, material: Option<Arc<Material>>) {
        self.material = material;
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.texture = texture;
    }

    pub fn crease_angle(&self) -> Option<f32> {
        self.crease_angle
    }

    /// Negative angles disable creasing.
    pub fn set_crease_angle(&mut self, degrees: Option<f32>) {
        self.crease_angle = degrees.filter(|d| *d >= 0.0);
    }

    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.double_sided = double_sided;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Position-fixed meshes (light markers) follow the scene lighting matrix
    /// instead of the view matrix and are culled with untransformed normals.
    pub fn is_position_fixed(&self) -> bool {
        self.position_fixed
    }

    pub fn set_position_fixed(&mut self, fixed: bool) {
        self.position_fixed = fixed;
    }

    pub fn render_mode(&self) -> Option<RenderMode> {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: Option<RenderMode>) {
        self.render_mode = mode;
    }

    /// Accumulated rotation in degrees, each axis wrapped into `[-180, 180)`.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    /// Size of the bounding box along each axis.
    pub fn size(&self) -> Vec3 {
        self.aabb.map_or(Vec3::ZERO, |b| b.size())
    }

    /// A trivial mesh is skipped by every stage of the pipeline.
    pub fn is_trivial(&self) -> bool {
        self.vertices.len() < 3 || self.faces.corner_count() < 3
    }

    /// True when the mesh can be drawn with its texture: the texture has
    /// texels, there is at least one uv pair, and any uv index buffer covers
    /// every face corner.
    pub fn has_texture(&self) -> bool {
        let Some(texture) = &self.texture else {
            return false;
        };
        texture.has_data()
            && self.tex_coords.len() >= 2
            && self
                .tex_coord_indices
                .as_ref()
                .map_or(true, |t| t.len() >= 3 && t.len() >= self.faces.corner_count())
    }

    /// True when the material or texture has transparency.
    pub fn is_transparent(&self, default_material: &Material) -> bool {
        let material = self.material.as_deref().unwrap_or(default_material);
        material.transparency() > 0.0
            || (self.has_texture() && self.texture.as_ref().is_some_and(|t| t.has_transparency()))
    }

    // ============ Initialization ============

    /// Computes any missing derived data: bounding box, face normals and
    /// vertex normals. Face normals are normalized last.
    pub fn init(&mut self) {
        if self.is_trivial() || self.faces.is_empty() {
            return;
        }
        if self.aabb.is_none() {
            self.calc_aabb();
        }
        if self.face_normals.is_empty() {
            self.calc_face_normals();
        }
        if self.vertex_normals.is_empty() {
            if self.crease_angle.is_some() {
                self.calc_creased_vertex_normals();
            } else {
                self.calc_vertex_normals();
            }
        }
        self.normalize_face_normals();
    }

    pub fn calc_aabb(&mut self) {
        self.aabb = Some(Aabb::from_vertices(&self.vertices));
    }

    /// Unnormalized face normals `(v1 - v0) x (v2 - v0)` from each face's first
    /// three corners. Faces with fewer than three corners get a zero normal.
    pub fn calc_face_normals(&mut self) {
        let mut normals = vec![0.0; self.faces.face_count() * 3];
        for (i, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                continue;
            }
            let v0 = self.vertex(face[0]);
            let v1 = self.vertex(face[1]);
            let v2 = self.vertex(face[2]);
            (v1 - v0).cross(v2 - v0).write_to(&mut normals, i);
        }
        self.face_normals = normals;
    }

    pub fn normalize_face_normals(&mut self) {
        normalize_vectors_in_place(&mut self.face_normals);
    }

    /// Smooth vertex normals: every face normal is summed into each of its
    /// vertices, then the sums are normalized. Normals are addressed by vertex
    /// index afterwards.
    pub fn calc_vertex_normals(&mut self) {
        if self.face_normals.is_empty() {
            self.calc_face_normals();
        }
        let mut normals = vec![0.0; self.vertices.len() - self.vertices.len() % 3];
        for (f, face) in self.faces.iter().enumerate() {
            let n = Vec3::from_slice(&self.face_normals, f);
            for &v in face {
                let slot = v as usize * 3;
                if let Some(dst) = normals.get_mut(slot..slot + 3) {
                    dst[0] += n.x;
                    dst[1] += n.y;
                    dst[2] += n.z;
                }
            }
        }
        normalize_vectors_in_place(&mut normals);
        self.vertex_normals = normals;
        self.vertex_normal_indices = None;
    }

    /// Creased vertex normals: one normal per face corner. Each corner starts
    /// from its own face normal and adds the normals of the other faces that
    /// share its vertex, but only when the angle between the two faces is
    /// within the crease angle.
    pub fn calc_creased_vertex_normals(&mut self) {
        if self.face_normals.is_empty() {
            self.calc_face_normals();
        }
        let threshold = self.crease_angle.unwrap_or(0.0).to_radians().cos() - 1e-6;

        let mut touching: Vec<Vec<u32>> = vec![Vec::new(); self.vertex_count()];
        for (f, face) in self.faces.iter().enumerate() {
            for &v in face {
                if let Some(faces) = touching.get_mut(v as usize) {
                    faces.push(f as u32);
                }
            }
        }

        let mut unit = vec![0.0; self.face_normals.len()];
        normalize_vectors(&self.face_normals, &mut unit);

        let mut normals = vec![0.0; self.faces.corner_count() * 3];
        for f0 in 0..self.faces.face_count() {
            let n0 = Vec3::from_slice(&unit, f0);
            let own = Vec3::from_slice(&self.face_normals, f0);
            for corner in self.faces.corners(f0) {
                let v = self.faces.corner_indices()[corner] as usize;
                let mut sum = own;
                for &f1 in touching.get(v).map(Vec::as_slice).unwrap_or_default() {
                    let f1 = f1 as usize;
                    if f1 != f0 && n0.dot(Vec3::from_slice(&unit, f1)) >= threshold {
                        sum += Vec3::from_slice(&self.face_normals, f1);
                    }
                }
                sum.write_to(&mut normals, corner);
            }
        }
        normalize_vectors_in_place(&mut normals);

        self.vertex_normals = normals;
        self.vertex_normal_indices = Some((0..self.faces.corner_count() as u32).collect());
    }

    #[inline]
    fn vertex(&self, index: u32) -> Vec3 {
        let i = index as usize * 3;
        match self.vertices.get(i..i + 3) {
            Some(v) => Vec3::new(v[0], v[1], v[2]),
            None => Vec3::ZERO,
        }
    }

    // ============ Positioning ============

    /// Rotates the mesh by `degrees` about X, then Y, then Z around `pivot`.
    ///
    /// Normals are rotated without the pivot translation. The accumulated
    /// rotation is kept wrapped into `[-180, 180)` per axis.
    pub fn rotate(&mut self, degrees: Vec3, pivot: RotationPivot) {
        let delta = Vec3::new(
            wrap_rotation_delta(self.rotation.x, degrees.x),
            wrap_rotation_delta(self.rotation.y, degrees.y),
            wrap_rotation_delta(self.rotation.z, degrees.z),
        );
        self.rotation += delta;

        let pivot = self.pivot_point(pivot);
        let (vertex_mat, normal_mat) = rotation_matrices(delta, pivot);

        transform_vectors_in_place(&vertex_mat, &mut self.vertices);
        transform_vectors_in_place(&normal_mat, &mut self.face_normals);
        transform_vectors_in_place(&normal_mat, &mut self.vertex_normals);
        self.calc_aabb();
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.translation += offset;
        let mut m = Mat3x4::identity();
        m.translate(offset.x, offset.y, offset.z);
        transform_vectors_in_place(&m, &mut self.vertices);
        self.calc_aabb();
    }

    /// Scales to an absolute `scaling` relative to the mesh's original size.
    /// A zero component leaves that axis unchanged.
    pub fn scale(&mut self, scaling: Vec3, anchor: ScaleAnchor) {
        let pct = Vec3::new(
            relative_factor(scaling.x, self.scaling.x),
            relative_factor(scaling.y, self.scaling.y),
            relative_factor(scaling.z, self.scaling.z),
        );
        self.apply_scale(pct, anchor);
    }

    /// Resizes the bounding box to `size`. A zero component leaves that axis
    /// unchanged.
    pub fn resize(&mut self, size: Vec3, anchor: ScaleAnchor) {
        let current = self.size();
        let pct = Vec3::new(
            relative_factor(size.x, current.x),
            relative_factor(size.y, current.y),
            relative_factor(size.z, current.z),
        );
        self.apply_scale(pct, anchor);
    }

    fn apply_scale(&mut self, pct: Vec3, anchor: ScaleAnchor) {
        self.scaling = Vec3::new(
            self.scaling.x * pct.x,
            self.scaling.y * pct.y,
            self.scaling.z * pct.z,
        );
        let aabb = self.aabb.unwrap_or_else(|| Aabb::from_vertices(&self.vertices));
        let fixed = match anchor {
            ScaleAnchor::Plus => aabb.min,
            ScaleAnchor::Minus => aabb.max,
            ScaleAnchor::Center => aabb.center(),
        };

        let mut m = Mat3x4::identity();
        m.scale(pct.x, pct.y, pct.z).translate(
            fixed.x - fixed.x * pct.x,
            fixed.y - fixed.y * pct.y,
            fixed.z - fixed.z * pct.z,
        );
        transform_vectors_in_place(&m, &mut self.vertices);
        self.calc_aabb();
    }

    /// Mirrors the mesh position across the origin along X.
    pub fn shift_x(&mut self) {
        let center = self.aabb.unwrap_or_else(|| Aabb::from_vertices(&self.vertices)).center();
        let mut m = Mat3x4::identity();
        m.translate(-2.0 * center.x, 0.0, 0.0);
        transform_vectors_in_place(&m, &mut self.vertices);
        self.calc_aabb();
    }

    /// Mirrors the mesh position across the origin along Z.
    pub fn shift_z(&mut self) {
        let center = self.aabb.unwrap_or_else(|| Aabb::from_vertices(&self.vertices)).center();
        let mut m = Mat3x4::identity();
        m.translate(0.0, 0.0, -2.0 * center.z);
        transform_vectors_in_place(&m, &mut self.vertices);
        self.calc_aabb();
    }

    /// Returns an initialized copy, rotated about `pivot`, then translated,
    /// then scaled. The copy shares this mesh's material and texture but has
    /// no scene id.
    pub fn clone_transformed(
        &self,
        name: Option<&str>,
        rotation: Vec3,
        pivot: RotationPivot,
        translation: Vec3,
        scaling: Option<Vec3>,
    ) -> Mesh {
        let delta = Vec3::new(
            wrap_rotation_delta(self.rotation.x, rotation.x),
            wrap_rotation_delta(self.rotation.y, rotation.y),
            wrap_rotation_delta(self.rotation.z, rotation.z),
        );
        let (mut xform, normal_mat) = rotation_matrices(delta, self.pivot_point(pivot));
        xform.translate(translation.x, translation.y, translation.z);

        let mut new_scaling = self.scaling;
        if let Some(s) = scaling {
            let pct = Vec3::new(
                relative_factor(s.x, self.scaling.x),
                relative_factor(s.y, self.scaling.y),
                relative_factor(s.z, self.scaling.z),
            );
            xform.scale(pct.x, pct.y, pct.z);
            new_scaling = Vec3::new(
                self.scaling.x * pct.x,
                self.scaling.y * pct.y,
                self.scaling.z * pct.z,
            );
        }

        let mut vertices = vec![0.0; self.vertices.len()];
        transform_vectors(&xform, &self.vertices, &mut vertices);
        let mut face_normals = vec![0.0; self.face_normals.len()];
        transform_vectors(&normal_mat, &self.face_normals, &mut face_normals);

        let mut mesh = Mesh::new(name.unwrap_or(&self.name), vertices, self.faces.clone());
        mesh.face_normals = face_normals;
        mesh.tex_coords = self.tex_coords.clone();
        mesh.tex_coord_indices = self.tex_coord_indices.clone();
        mesh.material = self.material.clone();
        mesh.texture = self.texture.clone();
        mesh.crease_angle = self.crease_angle;
        mesh.double_sided = self.double_sided;
        mesh.visible = self.visible;
        mesh.render_mode = self.render_mode;
        mesh.rotation = delta;
        mesh.translation = self.translation + translation;
        mesh.scaling = new_scaling;
        mesh.init();
        mesh
    }

    fn pivot_point(&self, pivot: RotationPivot) -> Option<Vec3> {
        match pivot {
            RotationPivot::Axis => Some(self.translation),
            RotationPivot::Scene => None,
            RotationPivot::Center => Some(
                self.aabb
                    .unwrap_or_else(|| Aabb::from_vertices(&self.vertices))
                    .center(),
            ),
        }
    }

    // ============ Procedural Meshes ============

    /// An axis-aligned cube of edge `size` centered on the origin, with one
    /// quad per side and a full `[0, 1]` uv square on every side.
    pub fn cube(size: f32) -> Mesh {
        let h = size * 0.5;
        #[rustfmt::skip]
        let vertices = vec![
            -h, -h, -h,   h, -h, -h,   h,  h, -h,  -h,  h, -h,
            -h, -h,  h,   h, -h,  h,   h,  h,  h,  -h,  h,  h,
        ];
        let faces = FaceList::from_polygons(&[
            [4, 5, 6, 7], // front
            [1, 0, 3, 2], // back
            [5, 1, 2, 6], // right
            [0, 4, 7, 3], // left
            [7, 6, 2, 3], // top
            [0, 1, 5, 4], // bottom
        ]);
        let tex_coords = vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let tex_coord_indices = (0..6).flat_map(|_| [0u32, 1, 2, 3]).collect();
        Mesh::new("cube", vertices, faces).with_tex_coords(tex_coords, Some(tex_coord_indices))
    }

    /// A unit icosahedron with a 41 degree crease angle. Used as the light
    /// marker.
    pub fn icosahedron() -> Mesh {
        let r = (1.0 + 5f32.sqrt()) / 2.0;
        let t = r / (1.0 + r * r).sqrt();
        let o = 1.0 / (1.0 + r * r).sqrt();
        #[rustfmt::skip]
        let vertices = vec![
             t,  o, 0.0,  -t,  o, 0.0,  -t, -o, 0.0,   t, -o, 0.0,
             o, 0.0,  t,   o, 0.0, -t,  -o, 0.0, -t,  -o, 0.0,  t,
            0.0,  t,  o,  0.0, -t,  o,  0.0, -t, -o,  0.0,  t, -o,
        ];
        let faces = FaceList::from_polygons(&[
            [4, 8, 7], [4, 7, 9], [5, 6, 11], [5, 10, 6], [0, 4, 3],
            [0, 3, 5], [2, 7, 1], [2, 1, 6], [8, 0, 11], [8, 11, 1],
            [9, 10, 3], [9, 2, 10], [8, 4, 0], [11, 0, 5], [4, 9, 3],
            [5, 3, 10], [7, 8, 1], [6, 1, 11], [7, 2, 9], [6, 10, 2],
        ]);
        Mesh::new("light", vertices, faces).with_crease_angle(Some(41.0))
    }

    /// A double-sided ground plane just under `aabb`, as wide as its larger
    /// horizontal extent. Textured planes are a single uv-mapped quad; plain
    /// planes are a 10x10 grid.
    pub fn ground_plane(aabb: &Aabb, textured: bool) -> Mesh {
        const GRIDS: u32 = 10;

        let center = aabb.center();
        let size = aabb.size();
        let half = 0.5 * size.x.max(size.z);
        let (min_x, min_z) = (center.x - half, center.z - half);
        let (max_x, max_z) = (center.x + half, center.z + half);
        let y = aabb.min.y - 0.001 * size.y;

        let mut plane = if textured {
            #[rustfmt::skip]
            let vertices = vec![
                min_x, y, min_z,   max_x, y, min_z,
                max_x, y, max_z,   min_x, y, max_z,
            ];
            let faces = FaceList::from_polygons(&[[0, 1, 2], [3, 0, 2]]);
            let uv_indices = faces.corner_indices().to_vec();
            Mesh::new("groundplane", vertices, faces).with_tex_coords(
                vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                Some(uv_indices),
            )
        } else {
            let step = 2.0 * half / GRIDS as f32;
            let mut vertices = Vec::with_capacity(((GRIDS + 1) * (GRIDS + 1) * 3) as usize);
            for i in 0..=GRIDS {
                for j in 0..=GRIDS {
                    vertices.extend_from_slice(&[
                        min_x + j as f32 * step,
                        y,
                        min_z + i as f32 * step,
                    ]);
                }
            }
            let row = GRIDS + 1;
            let quads: Vec<[u32; 4]> = (0..GRIDS)
                .flat_map(|i| {
                    (0..GRIDS).map(move |j| {
                        [i * row + j, (i + 1) * row + j, (i + 1) * row + j + 1, i * row + j + 1]
                    })
                })
                .collect();
            Mesh::new("groundplane", vertices, FaceList::from_polygons(&quads))
        };
        plane.double_sided = true;
        plane
    }
}

/// Wraps a rotation delta so that `current + delta` stays in `[-180, 180)`.
fn wrap_rotation_delta(current: f32, delta: f32) -> f32 {
    let delta = delta % 360.0;
    let target = current + delta;
    if target < -180.0 {
        delta + 360.0
    } else if target >= 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[inline]
fn relative_factor(target: f32, current: f32) -> f32 {
    if target != 0.0 && current != 0.0 {
        target / current
    } else {
        1.0
    }
}

/// Builds the vertex matrix (rotation about `pivot`) and the normal matrix
/// (rotation only) for a rotation delta in degrees.
fn rotation_matrices(delta: Vec3, pivot: Option<Vec3>) -> (Mat3x4, Mat3x4) {
    let mut normal_mat = Mat3x4::identity();
    normal_mat
        .rotate_about_x(delta.x)
        .rotate_about_y(delta.y)
        .rotate_about_z(delta.z);

    let mut vertex_mat = Mat3x4::identity();
    if let Some(p) = pivot {
        vertex_mat.translate(-p.x, -p.y, -p.z);
    }
    vertex_mat
        .rotate_about_x(delta.x)
        .rotate_about_y(delta.y)
        .rotate_about_z(delta.z);
    if let Some(p) = pivot {
        vertex_mat.translate(p.x, p.y, p.z);
    }
    (vertex_mat, normal_mat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        // two coplanar triangles in the z = 0 plane
        let vertices = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        Mesh::new("quad", vertices, FaceList::from_sentinel(&[0, 1, 2, -1, 0, 2, 3, -1]))
    }

    /// Two triangles sharing the edge (0,0,0)-(0,1,0), folded 90 degrees.
    fn fold() -> Mesh {
        #[rustfmt::skip]
        let vertices = vec![
            0.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
        ];
        // face 0 lies in z = 0 (normal +z), face 1 lies in x = 0 (normal +x)
        Mesh::new("fold", vertices, FaceList::from_polygons(&[[0, 2, 1], [0, 1, 3]]))
    }

    fn assert_unit_or_zero(buffer: &[f32]) {
        for n in buffer.chunks_exact(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!(len == 0.0 || (len - 1.0).abs() < 1e-5, "length {len}");
        }
    }

    #[test]
    fn init_produces_unit_face_normals() {
        let mut mesh = quad();
        mesh.init();
        assert_eq!(mesh.face_normals().len(), 3 * mesh.face_count());
        assert_unit_or_zero(mesh.face_normals());
        assert_relative_eq!(mesh.face_normals()[2], 1.0);
        let aabb = mesh.aabb().unwrap();
        assert_eq!(aabb.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn degenerate_face_gets_zero_normal() {
        let vertices = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 5.0, 0.0, 0.0];
        let mut mesh = Mesh::new("line", vertices, FaceList::from_polygons(&[vec![0, 1, 2], vec![0, 3]]));
        mesh.init();
        assert_eq!(mesh.face_normals().len(), 6);
        assert!(mesh.face_normals().iter().all(|&c| c == 0.0));
        assert_unit_or_zero(mesh.vertex_normals());
    }

    #[test]
    fn trivial_meshes_are_skipped_by_init() {
        let mut mesh = Mesh::new("empty", vec![0.0, 0.0], FaceList::default());
        assert!(mesh.is_trivial());
        mesh.init();
        assert!(mesh.face_normals().is_empty());
        assert!(mesh.aabb().is_none());
    }

    #[test]
    fn smooth_normals_are_indexed_by_vertex() {
        let mut mesh = quad();
        mesh.init();
        assert!(mesh.vertex_normal_indices().is_none());
        assert_eq!(mesh.vertex_normals().len(), 12);
        for n in mesh.vertex_normals().chunks_exact(3) {
            assert_relative_eq!(n[2], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn coplanar_faces_share_normals_for_any_crease_angle() {
        for angle in [0.0, 30.0, 90.0, 180.0] {
            let mut mesh = quad().with_crease_angle(Some(angle));
            mesh.init();
            let indices = mesh.vertex_normal_indices().unwrap();
            assert_eq!(indices.len(), mesh.faces().corner_count());
            for n in mesh.vertex_normals().chunks_exact(3) {
                assert_relative_eq!(n[0], 0.0, epsilon = 1e-6);
                assert_relative_eq!(n[1], 0.0, epsilon = 1e-6);
                assert_relative_eq!(n[2], 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn sharp_fold_splits_below_crease_angle() {
        let mut mesh = fold().with_crease_angle(Some(60.0));
        mesh.init();
        let normals = mesh.vertex_normals();
        // corner 0 of face 0 and corner 0 of face 1 are both vertex 0
        let a = Vec3::from_slice(normals, 0);
        let b = Vec3::from_slice(normals, 3);
        assert_relative_eq!(a.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(b.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn sharp_fold_is_averaged_at_crease_angle() {
        let mut mesh = fold().with_crease_angle(Some(90.0));
        mesh.init();
        let normals = mesh.vertex_normals();
        let a = Vec3::from_slice(normals, 0);
        let b = Vec3::from_slice(normals, 3);
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(a.x, expected, epsilon = 1e-5);
        assert_relative_eq!(a.z, expected, epsilon = 1e-5);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-6);
        // vertex 2 is only touched by face 0
        let lone = Vec3::from_slice(normals, 1);
        assert_relative_eq!(lone.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn rotation_wraps_and_moves_normals() {
        let mut mesh = quad();
        mesh.init();
        mesh.rotate(Vec3::new(0.0, 90.0, 0.0), RotationPivot::Scene);
        assert_relative_eq!(mesh.face_normals()[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.face_normals()[2], 0.0, epsilon = 1e-6);
        mesh.rotate(Vec3::new(0.0, 100.0, 0.0), RotationPivot::Scene);
        assert_relative_eq!(mesh.rotation().y, -170.0, epsilon = 1e-4);
    }

    #[test]
    fn center_pivot_keeps_the_center() {
        let mut mesh = Mesh::cube(2.0);
        mesh.translate(Vec3::new(5.0, 0.0, 0.0));
        mesh.init();
        mesh.rotate(Vec3::new(30.0, 45.0, 0.0), RotationPivot::Center);
        let c = mesh.aabb().unwrap().center();
        assert_relative_eq!(c.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(c.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn resize_with_plus_anchor_keeps_minimum_corner() {
        let mut mesh = Mesh::cube(2.0);
        mesh.init();
        mesh.resize(Vec3::new(4.0, 0.0, 1.0), ScaleAnchor::Plus);
        let aabb = mesh.aabb().unwrap();
        assert_relative_eq!(aabb.min.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(aabb.max.x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(aabb.size().y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(aabb.size().z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.scaling().x, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn scale_is_relative_to_original_size() {
        let mut mesh = Mesh::cube(2.0);
        mesh.init();
        mesh.scale(Vec3::new(2.0, 2.0, 2.0), ScaleAnchor::Center);
        mesh.scale(Vec3::new(3.0, 3.0, 3.0), ScaleAnchor::Center);
        assert_relative_eq!(mesh.size().x, 6.0, epsilon = 1e-5);
    }

    #[test]
    fn shift_mirrors_across_origin() {
        let mut mesh = Mesh::cube(1.0);
        mesh.translate(Vec3::new(3.0, 0.0, -2.0));
        mesh.shift_x();
        mesh.shift_z();
        let c = mesh.aabb().unwrap().center();
        assert_relative_eq!(c.x, -3.0, epsilon = 1e-6);
        assert_relative_eq!(c.z, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn clone_is_transformed_and_initialized() {
        let mut mesh = Mesh::cube(1.0);
        mesh.init();
        let copy = mesh.clone_transformed(
            Some("copy"),
            Vec3::ZERO,
            RotationPivot::Center,
            Vec3::new(0.0, 4.0, 0.0),
            None,
        );
        assert_eq!(copy.name(), "copy");
        assert!(copy.id().is_none());
        assert_relative_eq!(copy.aabb().unwrap().center().y, 4.0, epsilon = 1e-6);
        assert_eq!(copy.face_normals(), mesh.face_normals());
        assert_eq!(mesh.aabb().unwrap().center(), Vec3::ZERO);
    }

    #[test]
    fn cube_faces_point_outwards() {
        let mut cube = Mesh::cube(2.0);
        cube.init();
        let normals = cube.face_normals();
        let expected = [
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
        ];
        for (n, e) in normals.chunks_exact(3).zip(expected) {
            assert_relative_eq!(n[0], e[0]);
            assert_relative_eq!(n[1], e[1]);
            assert_relative_eq!(n[2], e[2]);
        }
        assert!(cube.texture().is_none());
        assert!(!cube.has_texture());
    }

    #[test]
    fn icosahedron_has_twenty_outward_faces() {
        let mut ico = Mesh::icosahedron();
        ico.init();
        assert_eq!(ico.face_count(), 20);
        for (f, face) in ico.faces().iter().enumerate() {
            let centroid = face
                .iter()
                .map(|&v| Vec3::from_slice(ico.vertices(), v as usize))
                .fold(Vec3::ZERO, |a, b| a + b);
            assert!(Vec3::from_slice(ico.face_normals(), f).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn ground_plane_sits_under_the_box() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let mut grid = Mesh::ground_plane(&aabb, false);
        grid.init();
        assert_eq!(grid.face_count(), 100);
        assert!(grid.is_double_sided());
        let b = grid.aabb().unwrap();
        assert!(b.max.y < 0.0);
        assert_relative_eq!(b.size().x, 6.0, epsilon = 1e-5);

        let quad = Mesh::ground_plane(&aabb, true);
        assert_eq!(quad.face_count(), 2);
        assert_eq!(quad.tex_coord_indices().unwrap().len(), 6);
    }

    #[test]
    fn transparency_follows_material_and_texture() {
        let opaque = Material::default();
        let mesh = quad();
        assert!(!mesh.is_transparent(&opaque));
        let glass = Arc::new(Material::new("glass", 0xffffff).with_transparency(0.5));
        assert!(quad().with_material(glass).is_transparent(&opaque));
    }
}
