//! Polygon face topology.
//!
//! Faces are stored explicitly: a flat array of vertex indices ("corners") plus
//! one offset per face marking where its run starts. Per-corner attributes
//! (vertex-normal indices, texture-coordinate indices) are kept in buffers
//! parallel to the corner array, so corner `k` of the mesh addresses the same
//! slot in every one of them.
//!
//! ```text
//!   sentinel input:  [0, 1, 2, -1, 2, 3, 4, 5, -1]
//!   corners:         [0, 1, 2, 2, 3, 4, 5]
//!   offsets:         [0, 3, 7]          (face i = corners[offsets[i]..offsets[i+1]])
//! ```
//!
//! Polygons with more than three corners are fan-triangulated on demand by
//! [`FanTriangles`], the single face-to-triangle iterator used by every
//! rasterizer.

use std::ops::Range;

/// Explicit face list over a flat corner array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceList {
    corners: Vec<u32>,
    offsets: Vec<u32>,
}

impl FaceList {
    /// Parses a sentinel-terminated index buffer where `-1` ends each face.
    ///
    /// A missing trailing sentinel is implied, so `[0, 1, 2]` describes one
    /// triangle. Empty runs (two sentinels in a row) produce no face.
    pub fn from_sentinel(indices: &[i32]) -> Self {
        let mut corners = Vec::with_capacity(indices.len());
        let mut offsets = vec![0u32];
        for &index in indices {
            if index < 0 {
                if corners.len() as u32 > *offsets.last().unwrap_or(&0) {
                    offsets.push(corners.len() as u32);
                }
            } else {
                corners.push(index as u32);
            }
        }
        if corners.len() as u32 > *offsets.last().unwrap_or(&0) {
            offsets.push(corners.len() as u32);
        }
        Self { corners, offsets }
    }

    /// Builds a face list from nested polygons.
    pub fn from_polygons<F: AsRef<[u32]>>(polygons: &[F]) -> Self {
        let mut corners = Vec::new();
        let mut offsets = vec![0u32];
        for polygon in polygons {
            let polygon = polygon.as_ref();
            if polygon.is_empty() {
                continue;
            }
            corners.extend_from_slice(polygon);
            offsets.push(corners.len() as u32);
        }
        Self { corners, offsets }
    }

    /// Builds a face list from triangle-only indices (3 per face).
    pub fn from_triangles(indices: &[u32]) -> Self {
        let corners = indices[..indices.len() - indices.len() % 3].to_vec();
        let offsets = (0..=corners.len() as u32 / 3).map(|i| i * 3).collect();
        Self { corners, offsets }
    }

    /// Builds a face list from a flat index array plus per-face arities.
    pub fn from_arities(indices: &[u32], arities: &[u32]) -> Self {
        let mut offsets = Vec::with_capacity(arities.len() + 1);
        offsets.push(0u32);
        let mut end = 0u32;
        for &arity in arities {
            end += arity;
            if end as usize > indices.len() {
                break;
            }
            offsets.push(end);
        }
        let corners = indices[..end.min(indices.len() as u32) as usize].to_vec();
        Self { corners, offsets }
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.face_count() == 0
    }

    /// The flat corner array.
    #[inline]
    pub fn corner_indices(&self) -> &[u32] {
        &self.corners
    }

    /// Range of face `face` within the flat corner array.
    #[inline]
    pub fn corners(&self, face: usize) -> Range<usize> {
        self.offsets[face] as usize..self.offsets[face + 1] as usize
    }

    /// Vertex indices of face `face`.
    #[inline]
    pub fn face(&self, face: usize) -> &[u32] {
        &self.corners[self.corners(face)]
    }

    /// Iterates over every face as a slice of vertex indices.
    pub fn iter(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.face_count()).map(move |i| self.face(i))
    }

    /// Highest vertex index referenced plus one.
    pub fn referenced_vertex_count(&self) -> usize {
        self.corners.iter().max().map_or(0, |&m| m as usize + 1)
    }

    /// Converts back to the sentinel-terminated form.
    pub fn to_sentinel(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(self.corners.len() + self.face_count());
        for face in self.iter() {
            out.extend(face.iter().map(|&i| i as i32));
            out.push(-1);
        }
        out
    }
}

/// Fan triangulation of one face: yields `[c0, ci, ci+1]` corner positions
/// (indices into the flat corner array) for `i` in `1..n-1`.
///
/// Faces with fewer than three corners yield nothing.
#[derive(Debug, Clone)]
pub struct FanTriangles {
    first: usize,
    next: usize,
    end: usize,
}

impl FanTriangles {
    pub fn new(corners: Range<usize>) -> Self {
        Self {
            first: corners.start,
            next: corners.start + 1,
            end: corners.end,
        }
    }
}

impl Iterator for FanTriangles {
    type Item = [usize; 3];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next + 1 < self.end {
            let tri = [self.first, self.next, self.next + 1];
            self.next += 1;
            Some(tri)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next + 1);
        (n, Some(n))
    }
}

impl ExactSizeIterator for FanTriangles {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sentinel_terminated_faces() {
        let faces = FaceList::from_sentinel(&[0, 1, 2, -1, 2, 3, 4, 5, -1]);
        assert_eq!(faces.face_count(), 2);
        assert_eq!(faces.face(0), &[0, 1, 2]);
        assert_eq!(faces.face(1), &[2, 3, 4, 5]);
        assert_eq!(faces.corners(1), 3..7);
    }

    #[test]
    fn missing_trailing_sentinel_is_implied() {
        let with = FaceList::from_sentinel(&[0, 1, 2, -1, 0, 2, 3, -1]);
        let without = FaceList::from_sentinel(&[0, 1, 2, -1, 0, 2, 3]);
        assert_eq!(with, without);
        assert_eq!(without.to_sentinel(), vec![0, 1, 2, -1, 0, 2, 3, -1]);
    }

    #[test]
    fn empty_input_has_no_faces() {
        assert!(FaceList::from_sentinel(&[]).is_empty());
        assert!(FaceList::from_sentinel(&[-1, -1]).is_empty());
    }

    #[test]
    fn fan_of_a_pentagon_shares_first_corner() {
        let tris: Vec<_> = FanTriangles::new(10..15).collect();
        assert_eq!(tris, vec![[10, 11, 12], [10, 12, 13], [10, 13, 14]]);
    }

    #[test]
    fn fan_of_a_degenerate_face_is_empty() {
        assert_eq!(FanTriangles::new(0..2).count(), 0);
        assert_eq!(FanTriangles::new(4..4).len(), 0);
    }

    #[test]
    fn arities_and_polygons_agree() {
        let a = FaceList::from_arities(&[0, 1, 2, 0, 2, 3, 4], &[3, 4]);
        let b = FaceList::from_polygons(&[vec![0, 1, 2], vec![0, 2, 3, 4]]);
        assert_eq!(a, b);
        assert_eq!(FaceList::from_triangles(&[0, 1, 2, 2, 1, 3]).face_count(), 2);
    }
}
