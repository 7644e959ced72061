//! Point cloud rendering: one 2x2 dot per vertex.

use super::MeshContext;
use crate::colors::OPAQUE;
use crate::render::framebuffer::FrameBuffer;

/// Draws every transformed vertex as a 2x2 block in the material's diffuse
/// color. Each of the four pixels is depth-tested on its own. Dots whose
/// block would leave the frame are skipped. No faces are visited, so culling
/// does not apply.
pub fn render_points(target: &mut FrameBuffer, ctx: &MeshContext) {
    let x_bound = target.width() as i32 - 1;
    let y_bound = target.height() as i32 - 1;
    let color = OPAQUE | ctx.material.diffuse_color();
    let count = ctx.mesh.vertex_count();

    for p in ctx.scratch.vertices().chunks_exact(3).take(count) {
        let x = (p[0] + 0.5) as i32;
        let y = (p[1] + 0.5) as i32;
        let z = p[2];
        if x < 0 || x >= x_bound || y < 0 || y >= y_bound {
            continue;
        }
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            target.set_pixel_with_depth(x + dx, y + dy, z, color, ctx.id);
        }
    }
}
