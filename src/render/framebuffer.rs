//! Frame buffer views for 2D pixel access.
//!
//! The renderer owns three parallel per-pixel buffers:
//!
//! | buffer | type | cleared to | written by |
//! |--------|------|------------|------------|
//! | color | `u32` ARGB | background | every rasterizer |
//! | depth | `f32` | `-inf` | opaque spans, points, lines |
//! | selection | `u32` mesh id | `0` | every rasterizer |
//!
//! Depth follows the frame matrix: larger z is closer to the viewer, so a
//! pixel is written only when its z is strictly greater than the stored one.

/// A mutable view into the color, depth and selection buffers.
///
/// Wraps 1D slices with width/height metadata. This is a borrowed view, not
/// an owning type: the renderer creates one per frame and hands it to the
/// rasterizers.
pub struct FrameBuffer<'a> {
    color: &'a mut [u32],
    depth: &'a mut [f32],
    selection: &'a mut [u32],
    width: u32,
    height: u32,
}

impl<'a> FrameBuffer<'a> {
    /// Create a new FrameBuffer view from buffer slices and dimensions.
    ///
    /// # Panics
    /// Panics in debug builds if any buffer is shorter than width * height.
    pub fn new(
        color: &'a mut [u32],
        depth: &'a mut [f32],
        selection: &'a mut [u32],
        width: u32,
        height: u32,
    ) -> Self {
        let len = (width * height) as usize;
        debug_assert!(color.len() >= len, "color buffer smaller than frame");
        debug_assert!(depth.len() >= len, "depth buffer smaller than frame");
        debug_assert!(selection.len() >= len, "selection buffer smaller than frame");
        Self {
            color: &mut color[..len],
            depth: &mut depth[..len],
            selection: &mut selection[..len],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub(crate) fn depth_at(&self, index: usize) -> f32 {
        self.depth[index]
    }

    #[inline]
    pub(crate) fn color_at(&self, index: usize) -> u32 {
        self.color[index]
    }

    /// Writes color, depth and selection id without testing.
    #[inline]
    pub(crate) fn write(&mut self, index: usize, color: u32, depth: f32, id: u32) {
        self.color[index] = color;
        self.depth[index] = depth;
        self.selection[index] = id;
    }

    /// Writes color and selection id, leaving depth untouched.
    #[inline]
    pub(crate) fn write_color(&mut self, index: usize, color: u32, id: u32) {
        self.color[index] = color;
        self.selection[index] = id;
    }

    /// Depth-tested write at `(x, y)`. Out-of-bounds coordinates are ignored.
    #[inline]
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, depth: f32, color: u32, id: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let idx = (y as u32 * self.width + x as u32) as usize;
            if depth > self.depth[idx] {
                self.write(idx, color, depth, id);
            }
        }
    }

    /// Get the color at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.color[i])
    }

    pub fn get_depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    pub fn get_selection(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.selection[i])
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32)
            .then(|| (y as u32 * self.width + x as u32) as usize)
    }
}

/// A read-only view of a finished frame, used for picking and inspection.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub color: &'a [u32],
    pub depth: &'a [f32],
    pub selection: &'a [u32],
    pub width: u32,
    pub height: u32,
}

impl FrameView<'_> {
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32)
            .then(|| (y as u32 * self.width + x as u32) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_keeps_the_nearer_write() {
        let (mut color, mut depth, mut sel) = (vec![0; 4], vec![f32::NEG_INFINITY; 4], vec![0; 4]);
        let mut fb = FrameBuffer::new(&mut color, &mut depth, &mut sel, 2, 2);
        fb.set_pixel_with_depth(1, 1, 5.0, 0xff00ff00, 1);
        fb.set_pixel_with_depth(1, 1, 2.0, 0xffff0000, 2);
        fb.set_pixel_with_depth(7, 0, 9.0, 0xffffffff, 3);
        assert_eq!(fb.get_pixel(1, 1), Some(0xff00ff00));
        assert_eq!(fb.get_selection(1, 1), Some(1));
        assert_eq!(fb.get_depth(1, 1), Some(5.0));
        assert_eq!(fb.get_pixel(7, 0), None);
    }

    #[test]
    fn longer_buffers_are_trimmed_to_the_frame() {
        let (mut color, mut depth, mut sel) = (vec![0; 16], vec![0.0; 16], vec![0; 16]);
        let fb = FrameBuffer::new(&mut color, &mut depth, &mut sel, 3, 2);
        assert_eq!(fb.get_pixel(2, 1), Some(0));
        assert_eq!(fb.get_pixel(3, 1), None);
    }
}
