//! Render list ordering.
//!
//! Meshes are drawn in two groups:
//!
//! 1. **Opaque**, nearest first. Larger depth is closer, so this is
//!    decreasing depth; near surfaces fill the z-buffer early and later
//!    fragments fail the depth test sooner.
//! 2. **Transparent**, farthest first (increasing depth). Transparent spans do
//!    not write depth, so they must be blended back to front.

use std::cmp::Ordering;

use crate::mesh::MeshId;

/// Sort key of one mesh for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderEntry {
    pub id: MeshId,
    /// Frame-space z of the mesh's bounding-box center.
    pub depth: f32,
    pub is_transparent: bool,
}

impl RenderEntry {
    pub fn new(id: MeshId, depth: f32, is_transparent: bool) -> Self {
        Self {
            id,
            depth,
            is_transparent,
        }
    }
}

/// Orders entries for drawing. Ties keep their input order. A NaN depth is
/// treated as the farthest possible depth so the order stays total.
pub fn sort_render_list(entries: &mut [RenderEntry]) {
    entries.sort_by(compare_entries);
}

fn compare_entries(a: &RenderEntry, b: &RenderEntry) -> Ordering {
    match (a.is_transparent, b.is_transparent) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, false) => sort_depth(b).total_cmp(&sort_depth(a)),
        (true, true) => sort_depth(a).total_cmp(&sort_depth(b)),
    }
}

#[inline]
fn sort_depth(entry: &RenderEntry) -> f32 {
    if entry.depth.is_nan() {
        f32::NEG_INFINITY
    } else {
        entry.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(entries: &[RenderEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.id.get()).collect()
    }

    #[test]
    fn opaque_first_then_transparent_back_to_front() {
        // A opaque at 5, B transparent at 3, C transparent at 8
        let mut list = vec![
            RenderEntry::new(MeshId(3), 8.0, true),
            RenderEntry::new(MeshId(2), 3.0, true),
            RenderEntry::new(MeshId(1), 5.0, false),
        ];
        sort_render_list(&mut list);
        assert_eq!(ids(&list), vec![1, 2, 3]);
    }

    #[test]
    fn opaque_meshes_are_nearest_first() {
        let mut list = vec![
            RenderEntry::new(MeshId(1), -2.0, false),
            RenderEntry::new(MeshId(2), 7.0, false),
            RenderEntry::new(MeshId(3), 1.0, false),
        ];
        sort_render_list(&mut list);
        assert_eq!(ids(&list), vec![2, 3, 1]);
    }

    #[test]
    fn nan_depth_does_not_panic_or_cross_groups() {
        let mut list = vec![
            RenderEntry::new(MeshId(1), f32::NAN, true),
            RenderEntry::new(MeshId(2), f32::NAN, false),
            RenderEntry::new(MeshId(3), 1.0, false),
        ];
        sort_render_list(&mut list);
        assert!(!list[0].is_transparent);
        assert!(!list[1].is_transparent);
        assert!(list[2].is_transparent);
        assert_eq!(list[0].id, MeshId(3));
    }
}
