//! Scene loading and load cancellation.
//!
//! Loads are started and finished in two steps so that slow resources can be
//! fetched anywhere (another thread, an async task, a callback). Each start
//! hands out a [`LoadTicket`]; only the most recent ticket of a
//! [`LoadTracker`] may apply its result:
//!
//! ```text
//!   begin -> #1          begin -> #2         complete(#1)   complete(#2)
//!   pending = 1          pending = 2         stale, dropped applied
//! ```
//!
//! [`load_obj`] converts an OBJ file (and its MTL library) into a [`Scene`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::error::LoadError;
use crate::face::FaceList;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::Scene;
use crate::texture::Texture;

/// Identifies one load request of a [`LoadTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// What happened to a completed load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The result was current and has been applied.
    Applied,
    /// A newer request was started; the result was dropped untouched.
    Superseded,
    /// The load was current but failed. Nothing was changed.
    Failed(LoadError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

/// Last-request-wins bookkeeping for one kind of resource.
#[derive(Debug)]
pub struct LoadTracker {
    label: &'static str,
    issued: u64,
    pending: Option<u64>,
}

impl LoadTracker {
    /// `label` names the resource in log lines.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            issued: 0,
            pending: None,
        }
    }

    /// Starts a new request, superseding any pending one.
    pub fn begin(&mut self) -> LoadTicket {
        self.issued += 1;
        if let Some(old) = self.pending.replace(self.issued) {
            info!(
                "{} load #{old} superseded by #{}",
                self.label, self.issued
            );
        }
        LoadTicket(self.issued)
    }

    /// True when `ticket` is the pending request.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.pending == Some(ticket.0)
    }

    /// Settles `ticket`. Returns `true` when its result may be applied;
    /// a stale ticket is logged and refused.
    pub fn complete(&mut self, ticket: LoadTicket) -> bool {
        if self.is_current(ticket) {
            self.pending = None;
            true
        } else {
            warn!(
                "discarding stale {} load #{} (latest is #{})",
                self.label, ticket.0, self.issued
            );
            false
        }
    }

    /// Drops the pending request, if any, so its completion will be refused.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

// ============ OBJ ============

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Loads an OBJ file and the materials of its MTL library into a new scene.
///
/// Diffuse textures are resolved relative to the OBJ file. A texture that
/// fails to decode is logged and skipped, and the meshes using it keep their
/// flat material. A missing or broken MTL library is logged and the meshes
/// fall back to the viewer's default material.
pub fn load_obj<P: AsRef<Path>>(path: P, use_mipmap: bool) -> Result<Scene, LoadError> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(path, &load_options())?;
    let materials = materials.unwrap_or_else(|e| {
        warn!("materials of '{}' could not be loaded: {e}", path.display());
        Vec::new()
    });
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let scene = scene_from_obj(&models, &materials, Some(base_dir), use_mipmap);

    if scene.is_empty() {
        return Err(LoadError::Empty(path.display().to_string()));
    }
    info!(
        "loaded '{}': {} meshes, {} materials",
        path.display(),
        scene.children().len(),
        materials.len()
    );
    Ok(scene)
}

/// Converts parsed OBJ models and materials into a scene. Trivial meshes are
/// dropped. Textures are only loaded when `texture_dir` is given.
pub fn scene_from_obj(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    texture_dir: Option<&Path>,
    use_mipmap: bool,
) -> Scene {
    let mut textures: HashMap<&str, Option<Arc<Texture>>> = HashMap::new();
    let converted: Vec<(Arc<Material>, Option<Arc<Texture>>)> = materials
        .iter()
        .map(|m| {
            let texture = match (&m.diffuse_texture, texture_dir) {
                (Some(file), Some(dir)) if !file.is_empty() => textures
                    .entry(file.as_str())
                    .or_insert_with(|| {
                        Texture::from_file(dir.join(file), use_mipmap)
                            .map(Arc::new)
                            .ok()
                    })
                    .clone(),
                _ => None,
            };
            (Arc::new(convert_material(m)), texture)
        })
        .collect();

    let mut scene = Scene::new();
    for model in models {
        let mut mesh = convert_mesh(model);
        if mesh.is_trivial() {
            continue;
        }
        if let Some((material, texture)) = model.mesh.material_id.and_then(|i| converted.get(i)) {
            mesh.set_material(Some(Arc::clone(material)));
            mesh.set_texture(texture.clone());
        }
        scene.add_child(mesh);
    }
    scene
}

/// Converts one OBJ material. `Kd` becomes the diffuse color, `d` the
/// opacity and `Ks` the specular color.
fn convert_material(m: &tobj::Material) -> Material {
    let diffuse = m.diffuse.map_or(crate::colors::DEFAULT_DIFFUSE, pack_color);
    let mut material = Material::new(m.name.clone(), diffuse);
    if let Some(specular) = m.specular {
        material = material.with_specular(pack_color(specular), 0.0);
    }
    if let Some(opacity) = m.dissolve {
        material = material.with_transparency(1.0 - opacity);
    }
    material
}

#[inline]
fn pack_color(rgb: [f32; 3]) -> u32 {
    let channel = |c: f32| ((c * 255.0) as i32 & 0xff) as u32;
    channel(rgb[0]) << 16 | channel(rgb[1]) << 8 | channel(rgb[2])
}

/// Converts one OBJ model. Texture coordinates are kept only when every face
/// corner has one; `v` is flipped so that row 0 is the top of the image.
/// Normals are always recomputed so that crease angles apply.
fn convert_mesh(model: &tobj::Model) -> Mesh {
    let src = &model.mesh;
    let faces = if src.face_arities.is_empty() {
        FaceList::from_triangles(&src.indices)
    } else {
        FaceList::from_arities(&src.indices, &src.face_arities)
    };
    let corner_count = faces.corner_count();
    let mut mesh = Mesh::new(model.name.clone(), src.positions.clone(), faces);

    if src.texcoords.len() >= 2 && src.texcoord_indices.len() >= corner_count {
        let mut tex_coords = src.texcoords.clone();
        for uv in tex_coords.chunks_exact_mut(2) {
            uv[1] = 1.0 - uv[1];
        }
        let indices = src.texcoord_indices[..corner_count].to_vec();
        mesh = mesh.with_tex_coords(tex_coords, Some(indices));
    }
    mesh
}
