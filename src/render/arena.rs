//! Per-mesh scratch buffers for transformed geometry.
//!
//! Each frame the renderer transforms every mesh into screen space. The
//! results live here, keyed by [`MeshId`], so the allocations survive from
//! frame to frame. Buffers only ever grow: a mesh whose geometry shrinks keeps
//! its larger allocation and the live length is tracked separately.

use std::collections::HashMap;

use log::debug;

use crate::math::batch::{transform_vector_zs, transform_vectors};
use crate::math::mat3x4::Mat3x4;
use crate::mesh::{Mesh, MeshId};

/// Which normal data the rasterizer for a mesh will read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalNeeds {
    /// Rotated z of every vertex normal (smooth shading).
    pub vertex_z: bool,
    /// Fully rotated vertex normals (sphere mapping).
    pub vertex_full: bool,
}

/// Transformed geometry of one mesh.
#[derive(Debug, Default)]
pub struct MeshScratch {
    vertices: Vec<f32>,
    face_normal_z: Vec<f32>,
    vertex_normal_z: Vec<f32>,
    vertex_normals: Vec<f32>,
    vertex_len: usize,
    face_len: usize,
    normal_z_len: usize,
    normal_len: usize,
}

impl MeshScratch {
    /// Screen-space vertices, `[x, y, z, ...]`.
    pub fn vertices(&self) -> &[f32] {
        &self.vertices[..self.vertex_len]
    }

    /// Rotated z of every face normal.
    pub fn face_normal_z(&self) -> &[f32] {
        &self.face_normal_z[..self.face_len]
    }

    /// Rotated z of every vertex normal. Empty unless requested.
    pub fn vertex_normal_z(&self) -> &[f32] {
        &self.vertex_normal_z[..self.normal_z_len]
    }

    /// Fully rotated vertex normals. Empty unless requested.
    pub fn vertex_normals(&self) -> &[f32] {
        &self.vertex_normals[..self.normal_len]
    }

    /// Transforms `mesh` with `xform` and its normals with `normal_mat`.
    pub fn transform(&mut self, mesh: &Mesh, xform: &Mat3x4, normal_mat: &Mat3x4, needs: NormalNeeds) {
        self.vertex_len = mesh.vertices().len();
        grow(&mut self.vertices, self.vertex_len);
        transform_vectors(xform, mesh.vertices(), &mut self.vertices);

        self.face_len = mesh.face_normals().len() / 3;
        grow(&mut self.face_normal_z, self.face_len);
        transform_vector_zs(normal_mat, mesh.face_normals(), &mut self.face_normal_z);

        let normals = mesh.vertex_normals();
        self.normal_z_len = 0;
        if needs.vertex_z {
            self.normal_z_len = normals.len() / 3;
            grow(&mut self.vertex_normal_z, self.normal_z_len);
            transform_vector_zs(normal_mat, normals, &mut self.vertex_normal_z);
        }
        self.normal_len = 0;
        if needs.vertex_full {
            self.normal_len = normals.len();
            grow(&mut self.vertex_normals, self.normal_len);
            transform_vectors(normal_mat, normals, &mut self.vertex_normals);
        }
    }

    /// Total allocated elements across all buffers.
    pub fn capacity(&self) -> usize {
        self.vertices.len()
            + self.face_normal_z.len()
            + self.vertex_normal_z.len()
            + self.vertex_normals.len()
    }
}

#[inline]
fn grow(buffer: &mut Vec<f32>, len: usize) {
    if buffer.len() < len {
        buffer.resize(len, 0.0);
    }
}

/// Scratch buffers for every mesh rendered in recent frames.
#[derive(Debug, Default)]
pub struct TransformArena {
    entries: HashMap<MeshId, MeshScratch>,
}

impl TransformArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scratch entry for `mesh`, created on first use.
    pub fn scratch_mut(&mut self, mesh: &Mesh, id: MeshId) -> &mut MeshScratch {
        self.entries.entry(id).or_insert_with(|| {
            debug!(
                "allocating transform scratch for mesh '{}' (id {}, {} vertices)",
                mesh.name(),
                id.get(),
                mesh.vertex_count()
            );
            MeshScratch::default()
        })
    }

    pub fn get(&self, id: MeshId) -> Option<&MeshScratch> {
        self.entries.get(&id)
    }

    /// Drops the entries of meshes that are no longer in `live`.
    pub fn retain_ids(&mut self, live: &[MeshId]) {
        self.entries.retain(|id, _| live.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
