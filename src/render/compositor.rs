//! Mapping the frame buffer onto the display surface.
//!
//! The frame is rendered at a resolution chosen by the [`Definition`]; the
//! compositor resamples it to the display:
//!
//! | definition | frame size | display pixel `(x, y)` |
//! |------------|------------|------------------------|
//! | low | `ceil(w / 2) x ceil(h / 2)` | frame pixel `(x / 2, y / 2)` |
//! | standard | `w x h` | frame pixel `(x, y)` |
//! | high | `2w x 2h` | channel average of the 2x2 block at `(2x, 2y)` |
//!
//! For high definition the alpha of the block's top-left pixel is kept.

use log::warn;

use crate::colors::{alpha, channels};
use crate::config::Definition;

/// Resamples `frame` (`frame_width` x `frame_height`, ARGB) into `display`
/// (`display_width` x `display_height`, ARGB).
///
/// Display pixels whose source lies outside the frame are left untouched.
pub fn composite(
    definition: Definition,
    frame: &[u32],
    frame_width: u32,
    frame_height: u32,
    display: &mut [u32],
    display_width: u32,
    display_height: u32,
) {
    let (fw, fh) = (frame_width as usize, frame_height as usize);
    let (dw, dh) = (display_width as usize, display_height as usize);
    if frame.len() < fw * fh || display.len() < dw * dh {
        warn!("composite skipped: frame {fw}x{fh} or display {dw}x{dh} buffer too small");
        return;
    }

    match definition.effective(display_width, display_height) {
        Definition::Standard => {
            for y in 0..dh.min(fh) {
                let n = dw.min(fw);
                display[y * dw..y * dw + n].copy_from_slice(&frame[y * fw..y * fw + n]);
            }
        }
        Definition::Low => {
            for y in 0..dh {
                let sy = y / 2;
                if sy >= fh {
                    break;
                }
                let src = &frame[sy * fw..(sy + 1) * fw];
                for (x, out) in display[y * dw..(y + 1) * dw].iter_mut().enumerate() {
                    if let Some(&c) = src.get(x / 2) {
                        *out = c;
                    }
                }
            }
        }
        Definition::High => {
            for y in 0..dh {
                let sy = y * 2;
                if sy + 1 >= fh {
                    break;
                }
                for x in 0..dw {
                    let sx = x * 2;
                    if sx + 1 >= fw {
                        break;
                    }
                    let top = sy * fw + sx;
                    let bottom = top + fw;
                    display[y * dw + x] = average_block([
                        frame[top],
                        frame[top + 1],
                        frame[bottom],
                        frame[bottom + 1],
                    ]);
                }
            }
        }
    }
}

/// Channel-wise average of four pixels with the first pixel's alpha.
#[inline]
fn average_block(block: [u32; 4]) -> u32 {
    let (mut r, mut g, mut b) = (0, 0, 0);
    for c in block {
        let (cr, cg, cb) = channels(c);
        r += cr;
        g += cg;
        b += cb;
    }
    alpha(block[0]) << 24 | (r >> 2) << 16 | (g >> 2) << 8 | (b >> 2)
}

/// Fills `buffer` (`width` x `height`) with a vertical gradient from `top` to
/// `bottom`. Pixels are opaque when `opaque` is set and fully transparent
/// otherwise.
pub fn fill_gradient(
    buffer: &mut [u32],
    width: u32,
    height: u32,
    top: u32,
    bottom: u32,
    opaque: bool,
) {
    let alpha_bits = if opaque { 0xff00_0000 } else { 0 };
    let (r1, g1, b1) = channels(top);
    let (r2, g2, b2) = channels(bottom);
    let h = height as f32;
    let lerp = |a: u32, b: u32, i: f32| {
        ((a as f32 + i * (b as f32 - a as f32) / h) as i32 & 0xff) as u32
    };

    for (i, row) in buffer
        .chunks_exact_mut(width.max(1) as usize)
        .take(height as usize)
        .enumerate()
    {
        let i = i as f32;
        let color = alpha_bits | lerp(r1, r2, i) << 16 | lerp(g1, g2, i) << 8 | lerp(b1, b2, i);
        row.fill(color);
    }
}
