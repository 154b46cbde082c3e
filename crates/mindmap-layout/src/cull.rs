#![forbid(unsafe_code)]

//! Viewport culling.
//!
//! Walks the visible tree from the root and drops whole subtrees whose
//! subtree bounds miss the viewport, so an off-screen branch costs one box
//! test regardless of its size.

use mindmap_core::geometry::Bounds;

use crate::engine::{Position, PositionMap};
use crate::index::GeometryIndex;

/// Positions of visible nodes intersecting `viewport` (world space), in
/// pre-order.
#[must_use]
pub fn visible_in_viewport<'a>(
    index: &GeometryIndex,
    positions: &'a PositionMap,
    viewport: Bounds,
) -> Vec<&'a Position> {
    let Some(root) = index.root_id() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(subtree) = index.subtree_bounds(id.as_str()) else {
            continue;
        };
        if !subtree.intersects(&viewport) {
            continue;
        }
        if let Some(position) = positions.get(id.as_str())
            && position.bounds().intersects(&viewport)
        {
            out.push(position);
        }
        stack.extend(index.visible_children(id.as_str()).iter().rev());
    }
    out
}
