//! A CPU software rasterizer and scene viewer for static 3D models.
//!
//! Meshes are transformed with a single affine (orthographic) matrix per frame,
//! sorted back to front and filled span by span into an ARGB frame buffer.
//! Shading uses a 256-entry palette per material indexed by the z component of
//! the transformed normal, so no lighting equation runs per pixel.
//!
//! # Quick Start
//!
//! ```ignore
//! use softview::prelude::*;
//!
//! let mut viewer = Viewer::new(640, 480, RenderConfig::default());
//! viewer.replace_scene(softview::loader::load_obj("model.obj", true)?);
//! viewer.render_frame();
//! let pixels: &[u32] = viewer.display_buffer();
//! ```

// Public API - exposed to library consumers
pub mod aabb;
pub mod colors;
pub mod config;
pub mod error;
pub mod face;
pub mod light;
pub mod loader;
pub mod material;
pub mod math;
pub mod mesh;
pub mod picking;
pub mod scene;
pub mod texture;
pub mod transform;
pub mod viewer;

// Internal modules - used within the crate only
pub(crate) mod render;

// Re-export commonly needed types at crate root for convenience
pub use config::{Definition, RenderConfig, RenderMode};
pub use error::{ConfigError, LoadError, TextureError};
pub use mesh::{Mesh, MeshId};
pub use render::FrameView;
pub use scene::Scene;
pub use viewer::Viewer;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use softview::prelude::*;
/// ```
pub mod prelude {
    // Configuration
    pub use crate::config::{Definition, RenderConfig, RenderMode};
    pub use crate::light::LightingMode;

    // Scene
    pub use crate::aabb::Aabb;
    pub use crate::face::FaceList;
    pub use crate::light::Light;
    pub use crate::material::Material;
    pub use crate::mesh::{Mesh, MeshId, RotationPivot, ScaleAnchor};
    pub use crate::scene::Scene;
    pub use crate::texture::Texture;

    // Viewing
    pub use crate::loader::{LoadOutcome, LoadTicket};
    pub use crate::picking::PickInfo;
    pub use crate::transform::ViewTransform;
    pub use crate::viewer::Viewer;

    // Math
    pub use crate::math::mat3x4::Mat3x4;
    pub use crate::math::vec3::Vec3;
}

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::render::{
        sort_render_list, FrameBuffer, RenderEntry, Renderer, Shading, TransformArena,
    };
}
