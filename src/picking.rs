//! Picking: which mesh covers a display pixel.
//!
//! Every rasterizer writes the id of the mesh it draws into the selection
//! buffer, next to the color and depth it writes. A pick query maps a display
//! coordinate into the frame and reads the id and depth back:
//!
//! | definition | frame coordinate |
//! |------------|------------------|
//! | low | `(x / 2, y / 2)` |
//! | standard | `(x, y)` |
//! | high | `(2x, 2y)` |

use crate::config::Definition;
use crate::mesh::MeshId;
use crate::render::framebuffer::FrameView;

/// The result of a pick query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickInfo {
    /// The display coordinate mapped into the frame.
    pub frame_x: i32,
    pub frame_y: i32,
    /// Depth of the picked surface, `-inf` when nothing was hit.
    pub depth: f32,
    /// The mesh covering the pixel, if any.
    pub mesh: Option<MeshId>,
}

impl PickInfo {
    fn miss(frame_x: i32, frame_y: i32) -> Self {
        Self {
            frame_x,
            frame_y,
            depth: f32::NEG_INFINITY,
            mesh: None,
        }
    }
}

/// Looks up the display pixel `(x, y)` in a finished frame.
///
/// `definition` is the one used to render the frame; it is resolved against
/// the display size the same way the renderer resolves it. Coordinates
/// outside the display miss.
pub fn pick(
    frame: &FrameView,
    definition: Definition,
    display_width: u32,
    display_height: u32,
    x: i32,
    y: i32,
) -> PickInfo {
    let (frame_x, frame_y) = match definition.effective(display_width, display_height) {
        Definition::Low => (x.div_euclid(2), y.div_euclid(2)),
        Definition::Standard => (x, y),
        Definition::High => (x.saturating_mul(2), y.saturating_mul(2)),
    };
    let on_display = x >= 0 && x < display_width as i32 && y >= 0 && y < display_height as i32;
    if !on_display {
        return PickInfo::miss(frame_x, frame_y);
    }

    match frame.index(frame_x, frame_y) {
        Some(i) if frame.selection[i] > 0 => PickInfo {
            frame_x,
            frame_y,
            depth: frame.depth[i],
            mesh: Some(MeshId(frame.selection[i])),
        },
        _ => PickInfo::miss(frame_x, frame_y),
    }
}
