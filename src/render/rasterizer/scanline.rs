//! The scanline skeleton shared by every filled rasterizer.
//!
//! Triangles are walked one row at a time from the bottom vertex up to the
//! top vertex, with two active edges and linear (affine) interpolation of N
//! attributes. Attribute 0 is always depth; the rest depend on the shading
//! variant (palette index, texel coordinates, sphere-map coordinates).
//!
//! # Vertex classification
//!
//! Screen coordinates are first rounded with `(v + 0.5) as i32`. The vertex
//! with the smallest y is `high` (top of the screen), the one with the largest
//! y is `low`, and the remaining one is `mid`:
//!
//! ```text
//!            high
//!            /|
//!   edge 2  / |
//!          /  |
//!       mid   |  edge 0 (the long edge)
//!          \  |
//!   edge 1  \ |
//!            \|
//!            low
//! ```
//!
//! Rows are visited from `y = Y[low]` while `y > Y[high]`. Below `Y[mid]` the
//! span runs between edge 0 and edge 1; from `Y[mid]` up it runs between
//! edge 0 and edge 2. Each edge starts at its lower vertex and steps every
//! attribute by `(start - end) / dy` per row, where a `dy` of 0 is replaced
//! by 1.
//!
//! # Spans
//!
//! Span ends are the edge x values truncated to integers. The per-pixel
//! increment is `(right - left) / (xr - xl)`, or 1 for a single-pixel span.
//! Spans are clipped to the frame: a negative left end advances every
//! attribute by the clipped distance, and the right end is clamped to
//! `width - 1`. The span handler decides whether the right end is inclusive
//! (opaque fills) or exclusive (transparent fills).

/// A triangle corner in frame space with its interpolated attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex<const N: usize> {
    pub x: f32,
    pub y: f32,
    /// `attrs[0]` is depth.
    pub attrs: [f32; N],
}

impl<const N: usize> ScreenVertex<N> {
    #[inline]
    pub fn new(x: f32, y: f32, attrs: [f32; N]) -> Self {
        Self { x, y, attrs }
    }
}

/// One clipped row of a triangle, ready to be shaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<const N: usize> {
    /// Index of pixel `(0, y)` in the frame buffers.
    pub row: usize,
    /// First pixel, already clipped to the frame.
    pub x_left: usize,
    /// Last pixel for inclusive fills, one past the last for exclusive ones.
    pub x_right: usize,
    /// Attribute values at `x_left`.
    pub attrs: [f32; N],
    /// Per-pixel attribute increments.
    pub incs: [f32; N],
}

impl<const N: usize> Span<N> {
    /// Pixel indices and attribute values of an inclusive span.
    #[inline]
    pub fn inclusive(&self) -> SpanPixels<N> {
        SpanPixels::new(self, self.x_right + 1)
    }

    /// Pixel indices and attribute values of an exclusive span.
    #[inline]
    pub fn exclusive(&self) -> SpanPixels<N> {
        SpanPixels::new(self, self.x_right)
    }
}

/// Iterator over the pixels of a span: `(buffer index, attributes)`.
pub struct SpanPixels<const N: usize> {
    index: usize,
    end: usize,
    attrs: [f32; N],
    incs: [f32; N],
}

impl<const N: usize> SpanPixels<N> {
    #[inline]
    fn new(span: &Span<N>, x_end: usize) -> Self {
        Self {
            index: span.row + span.x_left,
            end: span.row + x_end.max(span.x_left),
            attrs: span.attrs,
            incs: span.incs,
        }
    }
}

impl<const N: usize> Iterator for SpanPixels<N> {
    type Item = (usize, [f32; N]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }
        let item = (self.index, self.attrs);
        self.index += 1;
        for (a, inc) in self.attrs.iter_mut().zip(self.incs) {
            *a += inc;
        }
        Some(item)
    }
}

/// A triangle edge walked upwards one row at a time.
#[derive(Debug, Clone, Copy)]
struct Edge<const N: usize> {
    x: f32,
    attrs: [f32; N],
    x_step: f32,
    steps: [f32; N],
}

impl<const N: usize> Edge<N> {
    /// Edge from the lower vertex `start` towards the upper vertex `end`.
    #[inline]
    fn new(start: (f32, &[f32; N]), end: (f32, &[f32; N]), dy: i32) -> Self {
        let dy = if dy == 0 { 1.0 } else { dy as f32 };
        let mut steps = [0.0; N];
        for (i, step) in steps.iter_mut().enumerate() {
            *step = (start.1[i] - end.1[i]) / dy;
        }
        Self {
            x: start.0,
            attrs: *start.1,
            x_step: (start.0 - end.0) / dy,
            steps,
        }
    }

    #[inline]
    fn advance(&mut self) {
        self.x -= self.x_step;
        for (a, s) in self.attrs.iter_mut().zip(self.steps) {
            *a -= s;
        }
    }
}

/// Walks a triangle row by row and calls `shade` for every visible span.
///
/// Degenerate triangles (all corners on one row after rounding) produce no
/// spans. Rows outside `0..height` are stepped over without shading.
pub fn scan_triangle<const N: usize, F>(
    vertices: &[ScreenVertex<N>; 3],
    width: u32,
    height: u32,
    mut shade: F,
) where
    F: FnMut(&Span<N>),
{
    if width == 0 || height == 0 {
        return;
    }
    let xs = vertices.map(|v| (v.x + 0.5) as i32);
    let ys = vertices.map(|v| (v.y + 0.5) as i32);

    let mut high = 0;
    let mut low = 0;
    for i in 1..3 {
        if ys[i] < ys[high] {
            high = i;
        }
        if ys[i] >= ys[low] {
            low = i;
        }
    }
    if ys[high] == ys[low] {
        return;
    }
    let mid = 3 - low - high;

    let corner = |i: usize| (xs[i] as f32, &vertices[i].attrs);
    let mut long = Edge::new(corner(low), corner(high), ys[low] - ys[high]);
    let mut lower = Edge::new(corner(low), corner(mid), ys[low] - ys[mid]);
    let mut upper = Edge::new(corner(mid), corner(high), ys[mid] - ys[high]);

    let w = width as i32;
    let h = height as i32;
    let mut y = ys[low];
    while y > ys[high] {
        let below_mid = y > ys[mid];
        let short = if below_mid { &lower } else { &upper };

        if y >= 0 && y < h {
            let (mut l, mut r) = (&long, short);
            let (mut xl, mut xr) = (l.x as i32, r.x as i32);
            if xl > xr {
                std::mem::swap(&mut l, &mut r);
                std::mem::swap(&mut xl, &mut xr);
            }

            let mut attrs = l.attrs;
            let mut incs = [1.0; N];
            if xl != xr {
                let dx = (xr - xl) as f32;
                for i in 0..N {
                    incs[i] = (r.attrs[i] - l.attrs[i]) / dx;
                }
            }
            // Every shading variant shares this left-clip advance, the flat
            // fill included.
            if xl < 0 {
                for i in 0..N {
                    attrs[i] -= xl as f32 * incs[i];
                }
                xl = 0;
            }
            if xr >= w {
                xr = w - 1;
            }
            if xl <= xr {
                shade(&Span {
                    row: (y * w) as usize,
                    x_left: xl as usize,
                    x_right: xr as usize,
                    attrs,
                    incs,
                });
            }
        }

        long.advance();
        if below_mid {
            lower.advance();
        } else {
            upper.advance();
        }
        y -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn collect<const N: usize>(verts: [ScreenVertex<N>; 3], w: u32, h: u32) -> Vec<Span<N>> {
        let mut spans = Vec::new();
        scan_triangle(&verts, w, h, |s| spans.push(*s));
        spans
    }

    fn v(x: f32, y: f32) -> ScreenVertex<1> {
        ScreenVertex::new(x, y, [0.0])
    }

    #[test]
    fn flat_triangle_produces_no_spans() {
        assert!(collect([v(0.0, 5.0), v(10.0, 5.2), v(4.0, 4.9)], 20, 20).is_empty());
    }

    #[test]
    fn right_triangle_rows() {
        // corners at (0,0), (0,4), (4,4)
        let spans = collect([v(0.0, 0.0), v(0.0, 4.0), v(4.0, 4.0)], 10, 10);
        // rows 4, 3, 2, 1 are visited; row 0 is the top vertex and is excluded
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].row, 40);
        assert_eq!((spans[0].x_left, spans[0].x_right), (0, 4));
        assert_eq!((spans[3].x_left, spans[3].x_right), (0, 1));
    }

    #[test]
    fn spans_are_clipped_to_the_frame() {
        let spans = collect([v(-10.0, -3.0), v(-10.0, 8.0), v(30.0, 8.0)], 8, 6);
        assert!(!spans.is_empty());
        for s in &spans {
            assert!(s.row / 8 < 6);
            assert!(s.x_right <= 7);
        }
    }

    #[test]
    fn left_clip_advances_attributes() {
        // rounded x is -4 and 4; depth grows with x so that z = x
        let verts = [
            ScreenVertex::new(-4.5, 0.0, [-4.0]),
            ScreenVertex::new(-4.5, 4.0, [-4.0]),
            ScreenVertex::new(3.5, 4.0, [4.0]),
        ];
        let spans = collect(verts, 10, 10);
        let bottom = spans[0];
        assert_eq!(bottom.x_left, 0);
        assert_relative_eq!(bottom.incs[0], 1.0);
        assert_relative_eq!(bottom.attrs[0], 0.0);
    }

    #[test]
    fn span_pixels_respect_inclusivity() {
        let span = Span {
            row: 10,
            x_left: 2,
            x_right: 4,
            attrs: [1.0],
            incs: [0.5],
        };
        let inclusive: Vec<_> = span.inclusive().collect();
        assert_eq!(inclusive.len(), 3);
        assert_eq!(inclusive[2].0, 14);
        assert_relative_eq!(inclusive[2].1[0], 2.0);
        assert_eq!(span.exclusive().count(), 2);
    }

    #[test]
    fn offscreen_triangle_is_skipped() {
        assert!(collect([v(0.0, -20.0), v(5.0, -10.0), v(9.0, -15.0)], 10, 10).is_empty());
        assert!(collect([v(0.0, 0.0), v(5.0, 5.0), v(9.0, 0.0)], 0, 10).is_empty());
    }
}
