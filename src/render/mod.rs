//! The per-frame rendering pipeline: transform arena, render-list sorting,
//! rasterizers and the display compositor.

pub mod arena;
pub mod compositor;
pub mod framebuffer;
pub mod rasterizer;
pub mod renderer;
pub mod sorting;

pub use arena::{MeshScratch, NormalNeeds, TransformArena};
pub use compositor::composite;
pub use framebuffer::{FrameBuffer, FrameView};
pub use rasterizer::{rasterize_mesh, MeshContext, Shading};
pub use renderer::Renderer;
pub use sorting::{sort_render_list, RenderEntry};
