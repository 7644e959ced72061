//! Polygon outlines drawn with a DDA line walker.

use super::{visible_faces, MeshContext};
use crate::colors::OPAQUE;
use crate::render::framebuffer::FrameBuffer;

/// Draws the closed outline of every visible face in the material's diffuse
/// color, depth-tested per pixel.
pub fn render_wireframe(target: &mut FrameBuffer, ctx: &MeshContext) {
    let color = OPAQUE | ctx.material.diffuse_color();
    let faces = ctx.mesh.faces();
    let vertices = ctx.scratch.vertices();
    let point = |v: u32| {
        let i = v as usize * 3;
        vertices.get(i..i + 3).map(|p| (p[0], p[1], p[2]))
    };

    for (face, _) in visible_faces(ctx) {
        let corners = faces.face(face);
        for (k, &v0) in corners.iter().enumerate() {
            let v1 = corners[(k + 1) % corners.len()];
            if let (Some(p0), Some(p1)) = (point(v0), point(v1)) {
                draw_line(target, p0, p1, color, ctx.id);
            }
        }
    }
}

/// Walks the dominant axis one pixel at a time from the lower end, stepping
/// the other axis and z fractionally. The far end pixel is not drawn; the next
/// edge of the loop starts there. Pixels in the last row or column are
/// skipped.
fn draw_line(
    target: &mut FrameBuffer,
    p0: (f32, f32, f32),
    p1: (f32, f32, f32),
    color: u32,
    id: u32,
) {
    let x_bound = target.width() as f32 - 1.0;
    let y_bound = target.height() as f32 - 1.0;

    let (x0, y0) = ((p0.0 + 0.5) as i32, (p0.1 + 0.5) as i32);
    let (x1, y1) = ((p1.0 + 0.5) as i32, (p1.1 + 0.5) as i32);
    let dx = (x1 - x0) as f32;
    let dy = (y1 - y0) as f32;
    let dz = p1.2 - p0.2;

    let (mut dd, mut x_inc, mut y_inc, mut z_inc) = if dx.abs() > dy.abs() {
        let x_inc = dx.signum();
        (dx, x_inc, x_inc * dy / dx, x_inc * dz / dx)
    } else if dy != 0.0 {
        let y_inc = dy.signum();
        (dy, y_inc * dx / dy, y_inc, y_inc * dz / dy)
    } else {
        return;
    };

    let (mut x, mut y, mut z) = (x0 as f32, y0 as f32, p0.2);
    if dd < 0.0 {
        (x, y, z) = (x1 as f32, y1 as f32, p1.2);
        dd = -dd;
        x_inc = -x_inc;
        y_inc = -y_inc;
        z_inc = -z_inc;
    }

    for _ in 0..dd as i32 {
        if x >= 0.0 && x < x_bound && y >= 0.0 && y < y_bound {
            target.set_pixel_with_depth(x as i32, y as i32, z, color, id);
        }
        x += x_inc;
        y += y_inc;
        z += z_inc;
    }
}
