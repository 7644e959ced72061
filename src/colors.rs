//! Packed `0xAARRGGBB` color helpers shared by the palette builder, the
//! rasterizers and the compositor.
//!
//! All arithmetic stays in integer channel space (`0..=255`), matching the
//! fixed-point `>> 8` blends used throughout the pixel loops.

pub const ALPHA_MASK: u32 = 0xff00_0000;
pub const OPAQUE: u32 = 0xff00_0000;

pub const DEFAULT_MODEL_COLOR: u32 = 0xcaa618;
pub const DEFAULT_BACKGROUND_TOP: u32 = 0xffffff;
pub const DEFAULT_BACKGROUND_BOTTOM: u32 = 0x383840;
pub const DEFAULT_DIFFUSE: u32 = 0x7f7f7f;

/// Splits a packed color into its `(r, g, b)` channels.
#[inline]
pub const fn channels(color: u32) -> (u32, u32, u32) {
    ((color >> 16) & 0xff, (color >> 8) & 0xff, color & 0xff)
}

/// Packs three channels into an RGB value with no alpha.
#[inline]
pub const fn pack_rgb(r: u32, g: u32, b: u32) -> u32 {
    ((r & 0xff) << 16) | ((g & 0xff) << 8) | (b & 0xff)
}

/// Returns the alpha channel of a packed color.
#[inline]
pub const fn alpha(color: u32) -> u32 {
    color >> 24
}

/// Per-channel `c1 * c2 >> 8` modulation. The alpha of the result is zero.
#[inline]
pub fn modulate(c1: u32, c2: u32) -> u32 {
    let (r1, g1, b1) = channels(c1);
    let (r2, g2, b2) = channels(c2);
    pack_rgb((r1 * r2) >> 8, (g1 * g2) >> 8, (b1 * b2) >> 8)
}

/// Blends `fore` over `back` with an integer `opacity` in `0..=255`:
/// `(fore * opacity + back * (255 - opacity)) >> 8` per channel. The alpha of
/// the result is zero; callers attach their own alpha.
#[inline]
pub fn blend(back: u32, fore: u32, opacity: u32) -> u32 {
    let trans = 255 - opacity;
    let (br, bg, bb) = channels(back);
    let (fr, fg, fb) = channels(fore);
    pack_rgb(
        (br * trans + fr * opacity) >> 8,
        (bg * trans + fg * opacity) >> 8,
        (bb * trans + fb * opacity) >> 8,
    )
}

/// Default ambient color derived from a diffuse color: every channel `>> 3`.
#[inline]
pub fn ambient_from_diffuse(diffuse: u32) -> u32 {
    let (r, g, b) = channels(diffuse);
    pack_rgb(r >> 3, g >> 3, b >> 3)
}

/// Converts packed ARGB pixels into `RGBA` bytes for presentation.
pub fn to_rgba8(pixels: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(pixels.len() * 4);
    for &p in pixels {
        let (r, g, b) = channels(p);
        bytes.extend_from_slice(&[r as u8, g as u8, b as u8, alpha(p) as u8]);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulate_by_white_is_nearly_identity() {
        assert_eq!(modulate(0x804020, 0xffffff), 0x7f3f1f);
    }

    #[test]
    fn blend_extremes_select_one_side() {
        assert_eq!(blend(0x000000, 0xffffff, 0), 0x000000);
        assert_eq!(blend(0x000000, 0xffffff, 255), 0xfefefe);
        assert_eq!(blend(0xff0000, 0x0000ff, 128) & 0xff, 0x7f);
    }

    #[test]
    fn ambient_is_an_eighth_of_diffuse() {
        assert_eq!(ambient_from_diffuse(0x7f7f7f), 0x0f0f0f);
    }

    #[test]
    fn rgba_bytes_keep_alpha_last() {
        assert_eq!(to_rgba8(&[0x80112233]), vec![0x11, 0x22, 0x33, 0x80]);
    }
}
